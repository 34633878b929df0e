use crate::config::WebsiteConfig;

/// Source of the competitor sites the scheduler updates
pub trait WebsiteRegistry: Send + Sync {
    fn websites(&self) -> Vec<WebsiteConfig>;
}

/// A fixed in-process site list, usually the loaded config's `websites`
#[derive(Debug, Default)]
pub struct StaticRegistry {
    sites: Vec<WebsiteConfig>,
}

impl StaticRegistry {
    pub fn new(sites: Vec<WebsiteConfig>) -> Self {
        Self { sites }
    }
}

impl WebsiteRegistry for StaticRegistry {
    fn websites(&self) -> Vec<WebsiteConfig> {
        self.sites.clone()
    }
}
