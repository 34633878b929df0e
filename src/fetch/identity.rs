//! User-Agent rotation and retry jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Browser identities rotated across requests
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Random source for identity choice and jitter
///
/// Seed it for deterministic tests.
#[derive(Debug)]
pub struct IdentityRotator {
    pool: Vec<String>,
    rng: Mutex<StdRng>,
}

impl IdentityRotator {
    pub fn new(pool: Vec<String>, rng: StdRng) -> Self {
        Self {
            pool,
            rng: Mutex::new(rng),
        }
    }

    /// Default pool, seeded from the OS
    pub fn from_os_rng() -> Self {
        Self::new(default_pool(), StdRng::from_os_rng())
    }

    /// Default pool, deterministic seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(default_pool(), StdRng::seed_from_u64(seed))
    }

    /// The identity sent when rotation is off and the caller set none
    pub fn default_user_agent(&self) -> &str {
        self.pool.first().map(String::as_str).unwrap_or(USER_AGENTS[0])
    }

    /// Picks a User-Agent from the pool
    pub fn next_user_agent(&self) -> String {
        if self.pool.is_empty() {
            return USER_AGENTS[0].to_string();
        }
        let index = self.with_rng(|rng| rng.random_range(0..self.pool.len()));
        self.pool[index].clone()
    }

    /// A random delay in `[0, max]`
    pub fn jitter(&self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = max.as_millis().min(u64::MAX as u128) as u64;
        Duration::from_millis(self.with_rng(|rng| rng.random_range(0..=max_ms)))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

fn default_pool() -> Vec<String> {
    USER_AGENTS.iter().map(|s| s.to_string()).collect()
}
