use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a scheduler run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Record of one scheduler run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskResult {
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub total_sites: usize,
    pub success_sites: usize,
    pub failed_sites: usize,
    pub new_urls: usize,
    pub updated_urls: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl UpdateTaskResult {
    /// A `Running` record with empty counters
    pub fn started(task_id: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.to_string(),
            start_time,
            end_time: None,
            status: TaskStatus::Running,
            total_sites: 0,
            success_sites: 0,
            failed_sites: 0,
            new_urls: 0,
            updated_urls: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Sets the terminal status, end time and duration
    pub fn finish(&mut self, status: TaskStatus, end_time: DateTime<Utc>) {
        self.status = status;
        self.end_time = Some(end_time);
        self.duration_ms = (end_time - self.start_time).num_milliseconds().max(0) as u64;
    }

    /// Adds one site outcome to the counters
    pub fn record_site(&mut self, site: &SiteUpdateResult) {
        match site.status {
            SiteStatus::Success => {
                self.success_sites += 1;
                self.new_urls += site.new_urls;
                self.updated_urls += site.updated_urls;
            }
            SiteStatus::Failed => {
                self.failed_sites += 1;
                let error = site.error.as_deref().unwrap_or("unknown error");
                self.errors.push(format!("{}: {}", site.website_name, error));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    Success,
    Failed,
}

/// Outcome of updating one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteUpdateResult {
    pub website_id: String,
    pub website_name: String,
    pub status: SiteStatus,
    pub new_urls: usize,
    pub updated_urls: usize,
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Sitemap fetches made, retries included
    pub attempts: u32,
}

/// Scheduler errors raised to the caller
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("update already running")]
    AlreadyRunning,

    #[error("state storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid scheduler config: {0}")]
    InvalidConfig(#[from] crate::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, status: SiteStatus, new_urls: usize, updated_urls: usize) -> SiteUpdateResult {
        SiteUpdateResult {
            website_id: name.to_lowercase(),
            website_name: name.to_string(),
            status,
            new_urls,
            updated_urls,
            error: (status == SiteStatus::Failed).then(|| "HTTP 500".to_string()),
            duration_ms: 1,
            attempts: 1,
        }
    }

    #[test]
    fn test_record_site_aggregation() {
        let mut task = UpdateTaskResult::started("t", Utc::now());
        task.record_site(&site("Poki", SiteStatus::Success, 3, 7));
        task.record_site(&site("Crazy", SiteStatus::Failed, 0, 0));
        task.record_site(&site("Itch", SiteStatus::Success, 1, 0));

        assert_eq!(task.success_sites, 2);
        assert_eq!(task.failed_sites, 1);
        assert_eq!(task.new_urls, 4);
        assert_eq!(task.updated_urls, 7);
        assert_eq!(task.errors, vec!["Crazy: HTTP 500"]);
    }

    #[test]
    fn test_finish_sets_duration() {
        let start = Utc::now();
        let mut task = UpdateTaskResult::started("t", start);
        assert_eq!(task.status, TaskStatus::Running);

        task.finish(TaskStatus::Completed, start + chrono::Duration::milliseconds(1500));

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.duration_ms, 1500);
        assert!(task.end_time.is_some());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(SchedulerError::AlreadyRunning.to_string(), "update already running");
    }
}
