//! Update scheduler module
//!
//! This module handles:
//! - Single-run guarding and batched, retried site updates
//! - Incremental URL diffs between snapshots
//! - Periodic refreshes through a cancellable ticker
//! - Task history and last-update bookkeeping

mod clock;
mod diff;
mod registry;
mod runner;
mod ticker;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diff::UrlDiff;
pub use registry::{StaticRegistry, WebsiteRegistry};
pub use runner::{SchedulerBuilder, UpdateScheduler, DEFAULT_BATCH_DELAY, DEFAULT_RETRY_BASE};
pub use ticker::TickerHandle;
pub use types::{SchedulerError, SiteStatus, SiteUpdateResult, TaskStatus, UpdateTaskResult};
