//! Update scheduler - orchestration of sitemap refresh runs
//!
//! This module contains the run loop that:
//! - Guards against overlapping runs with a single active-run slot
//! - Updates sites in batches of `max_concurrent`
//! - Retries failing sites with a linearly growing delay
//! - Diffs each new snapshot against the previous one
//! - Records every finished run to the capped history
//! - Drives periodic refreshes from a cancellable ticker

use crate::config::{validate_task_config, UpdateTaskConfig, WebsiteConfig};
use crate::scheduler::clock::{Clock, SystemClock};
use crate::scheduler::diff::UrlDiff;
use crate::scheduler::registry::WebsiteRegistry;
use crate::scheduler::ticker::TickerHandle;
use crate::scheduler::types::{
    SchedulerError, SiteStatus, SiteUpdateResult, TaskStatus, UpdateTaskResult,
};
use crate::sitemap::{SitemapSnapshot, SitemapSource};
use crate::storage::StateStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

/// Pause between two batches of sites
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Base of the per-site retry delay (`base × attempt`)
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(2);

/// Tolerance on the update interval, absorbs ticker wake-up jitter
const DUE_SLACK_SECS: i64 = 60;

/// The run currently holding the slot
struct ActiveRun {
    task: UpdateTaskResult,
    cancel: Arc<AtomicBool>,
}

struct Inner {
    store: StateStore,
    registry: Arc<dyn WebsiteRegistry>,
    source: Arc<dyn SitemapSource>,
    clock: Arc<dyn Clock>,
    batch_delay: Duration,
    retry_base: Duration,
    config: Mutex<UpdateTaskConfig>,
    active: Mutex<Option<ActiveRun>>,
    ticker: Mutex<Option<TickerHandle>>,
    started: AtomicBool,
}

/// Releases the active-run slot if the run future is dropped early
struct SlotGuard<'a> {
    inner: &'a Inner,
    task_id: String,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut active = lock(&self.inner.active);
        if active.as_ref().map(|run| run.task_id()) == Some(self.task_id.as_str()) {
            *active = None;
        }
    }
}

impl ActiveRun {
    fn task_id(&self) -> &str {
        &self.task.task_id
    }
}

/// Builder for `UpdateScheduler`
pub struct SchedulerBuilder {
    store: StateStore,
    registry: Arc<dyn WebsiteRegistry>,
    source: Arc<dyn SitemapSource>,
    clock: Arc<dyn Clock>,
    batch_delay: Duration,
    retry_base: Duration,
}

impl SchedulerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    /// Builds the scheduler with the persisted config, or the default one
    pub fn build(self) -> Result<UpdateScheduler, SchedulerError> {
        let config = match self.store.load_task_config()? {
            Some(stored) => match validate_task_config(&stored) {
                Ok(()) => stored,
                Err(e) => {
                    tracing::warn!("Ignoring invalid stored scheduler config: {}", e);
                    UpdateTaskConfig::default()
                }
            },
            None => UpdateTaskConfig::default(),
        };

        Ok(UpdateScheduler {
            inner: Arc::new(Inner {
                store: self.store,
                registry: self.registry,
                source: self.source,
                clock: self.clock,
                batch_delay: self.batch_delay,
                retry_base: self.retry_base,
                config: Mutex::new(config),
                active: Mutex::new(None),
                ticker: Mutex::new(None),
                started: AtomicBool::new(false),
            }),
        })
    }
}

/// Orchestrates sitemap refreshes across all competitor sites
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct UpdateScheduler {
    inner: Arc<Inner>,
}

impl UpdateScheduler {
    pub fn builder(
        store: StateStore,
        registry: Arc<dyn WebsiteRegistry>,
        source: Arc<dyn SitemapSource>,
    ) -> SchedulerBuilder {
        SchedulerBuilder {
            store,
            registry,
            source,
            clock: Arc::new(SystemClock),
            batch_delay: DEFAULT_BATCH_DELAY,
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    // ===== Lifecycle =====

    /// Starts periodic updates
    ///
    /// Persists `config`; when `auto_update` is set, arms the ticker at
    /// `interval_hours` and spawns one immediate eligibility check.
    /// Must be called from within a tokio runtime.
    pub fn start_scheduler(&self, config: UpdateTaskConfig) -> Result<(), SchedulerError> {
        validate_task_config(&config)?;
        self.inner.store.save_task_config(&config)?;
        *lock(&self.inner.config) = config.clone();
        self.inner.started.store(true, Ordering::SeqCst);

        self.rearm_ticker(&config);

        if config.auto_update {
            let scheduler = self.clone();
            tokio::spawn(async move {
                if let Err(e) = scheduler.check_and_update().await {
                    tracing::error!("Initial update check failed: {}", e);
                }
            });
        }

        tracing::info!(
            "Scheduler started (auto_update: {}, interval: {}h, max_concurrent: {})",
            config.auto_update,
            config.interval_hours,
            config.max_concurrent
        );
        Ok(())
    }

    /// Disarms the ticker and cancels the active run, if any
    ///
    /// # Returns
    ///
    /// The cancelled run as recorded to history, or `None` when idle.
    /// Site updates already dispatched keep running but are not counted.
    pub fn stop_scheduler(&self) -> Result<Option<UpdateTaskResult>, SchedulerError> {
        self.inner.started.store(false, Ordering::SeqCst);
        if let Some(ticker) = lock(&self.inner.ticker).take() {
            ticker.stop();
        }

        let Some(run) = lock(&self.inner.active).take() else {
            tracing::info!("Scheduler stopped");
            return Ok(None);
        };

        run.cancel.store(true, Ordering::SeqCst);
        let mut task = run.task;
        task.finish(TaskStatus::Cancelled, self.inner.clock.now());
        self.inner.store.append_history(&task)?;

        tracing::warn!("Scheduler stopped, run {} cancelled", task.task_id);
        Ok(Some(task))
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    fn rearm_ticker(&self, config: &UpdateTaskConfig) {
        let mut ticker = lock(&self.inner.ticker);
        if let Some(old) = ticker.take() {
            old.stop();
        }

        if !config.auto_update {
            return;
        }

        let period = Duration::from_secs(config.interval_hours.saturating_mul(3600));
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        *ticker = Some(TickerHandle::spawn(period, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let scheduler = UpdateScheduler { inner };
                if let Err(e) = scheduler.check_and_update().await {
                    tracing::error!("Scheduled update failed: {}", e);
                }
            }
        }));
        tracing::debug!("Ticker armed every {:?}", period);
    }

    // ===== Eligibility =====

    /// True when auto-update is on and the interval has elapsed since the
    /// start of the last completed run (or no run ever completed)
    pub fn should_update(&self) -> Result<bool, SchedulerError> {
        let config = self.get_config();
        if !config.auto_update {
            return Ok(false);
        }

        let Some(last) = self.inner.store.last_update()? else {
            return Ok(true);
        };

        let interval = chrono::Duration::hours(config.interval_hours as i64)
            - chrono::Duration::seconds(DUE_SLACK_SECS);
        Ok(self.inner.clock.now() - last >= interval)
    }

    /// Runs an update if one is due and none is active
    pub async fn check_and_update(&self) -> Result<Option<UpdateTaskResult>, SchedulerError> {
        if !self.should_update()? {
            tracing::debug!("No update due");
            return Ok(None);
        }

        match self.run_update(false).await {
            Ok(task) => Ok(Some(task)),
            Err(SchedulerError::AlreadyRunning) => {
                tracing::info!("Skipping scheduled update, a run is already active");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs one update now
    ///
    /// # Arguments
    ///
    /// * `force` - Ignore previous snapshots so every URL counts as new
    ///
    /// # Returns
    ///
    /// * `Ok(UpdateTaskResult)` - The finished run, whatever its status
    /// * `Err(SchedulerError::AlreadyRunning)` - Another run is active
    pub async fn trigger_manual_update(&self, force: bool) -> Result<UpdateTaskResult, SchedulerError> {
        tracing::info!("Manual update requested (force: {})", force);
        self.run_update(force).await
    }

    // ===== Runs =====

    async fn run_update(&self, force: bool) -> Result<UpdateTaskResult, SchedulerError> {
        let (task, cancel) = self.claim_slot()?;
        let guard = SlotGuard {
            inner: &self.inner,
            task_id: task.task_id.clone(),
        };

        let task = self.execute(task, &cancel, force).await;
        let result = self.finalize(task);
        drop(guard);
        result
    }

    fn claim_slot(&self) -> Result<(UpdateTaskResult, Arc<AtomicBool>), SchedulerError> {
        let mut active = lock(&self.inner.active);
        if active.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let task = UpdateTaskResult::started(&uuid::Uuid::new_v4().to_string(), self.inner.clock.now());
        let cancel = Arc::new(AtomicBool::new(false));
        *active = Some(ActiveRun {
            task: task.clone(),
            cancel: Arc::clone(&cancel),
        });

        tracing::info!("Update run {} started", task.task_id);
        Ok((task, cancel))
    }

    /// Processes every eligible site; returns the task with its final status
    async fn execute(&self, mut task: UpdateTaskResult, cancel: &AtomicBool, force: bool) -> UpdateTaskResult {
        let config = self.get_config();

        let sites: Vec<WebsiteConfig> = self
            .inner
            .registry
            .websites()
            .into_iter()
            .filter(|site| site.enabled || !config.only_enabled_sites)
            .collect();

        if sites.is_empty() {
            tracing::warn!("Update run {} has no sites to update", task.task_id);
            task.errors.push("no sites to update".to_string());
            task.finish(TaskStatus::Failed, self.inner.clock.now());
            return task;
        }

        task.total_sites = sites.len();
        self.publish_progress(&task);

        let batch_size = config.max_concurrent.max(1);
        for (index, batch) in sites.chunks(batch_size).enumerate() {
            if index > 0 && !self.inner.batch_delay.is_zero() {
                tokio::time::sleep(self.inner.batch_delay).await;
            }
            if cancel.load(Ordering::SeqCst) {
                break;
            }

            tracing::debug!(
                "Run {}: batch {} with {} site(s)",
                task.task_id,
                index + 1,
                batch.len()
            );

            let results = join_all(
                batch
                    .iter()
                    .map(|site| self.update_site(site, force, config.max_retries)),
            )
            .await;

            if cancel.load(Ordering::SeqCst) {
                break;
            }

            for result in &results {
                task.record_site(result);
            }
            self.publish_progress(&task);
        }

        let status = if cancel.load(Ordering::SeqCst) {
            TaskStatus::Cancelled
        } else if task.failed_sites > 0 {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        task.finish(status, self.inner.clock.now());
        task
    }

    /// Releases the slot and records the run
    ///
    /// A run cancelled by `stop_scheduler` was already recorded there; its
    /// history entry is returned as is.
    fn finalize(&self, task: UpdateTaskResult) -> Result<UpdateTaskResult, SchedulerError> {
        let still_active = {
            let mut active = lock(&self.inner.active);
            let ours = active.as_ref().map(|run| run.task_id()) == Some(task.task_id.as_str());
            if ours {
                *active = None;
            }
            ours
        };

        if !still_active {
            let recorded = self
                .inner
                .store
                .load_history()?
                .into_iter()
                .find(|t| t.task_id == task.task_id);
            return Ok(recorded.unwrap_or(task));
        }

        self.inner.store.append_history(&task)?;
        // Measured from the start so the next tick finds the run due
        if task.status == TaskStatus::Completed {
            self.inner.store.set_last_update(task.start_time)?;
        }

        tracing::info!(
            "Update run {} finished: {:?}, {} ok, {} failed, {} new URLs, {} updated URLs in {}ms",
            task.task_id,
            task.status,
            task.success_sites,
            task.failed_sites,
            task.new_urls,
            task.updated_urls,
            task.duration_ms
        );
        for error in &task.errors {
            tracing::warn!("Run {}: {}", task.task_id, error);
        }

        Ok(task)
    }

    fn publish_progress(&self, task: &UpdateTaskResult) {
        let mut active = lock(&self.inner.active);
        if let Some(run) = active.as_mut() {
            if run.task.task_id == task.task_id {
                run.task = task.clone();
            }
        }
    }

    // ===== Sites =====

    /// Refreshes one site against its stored snapshot
    pub async fn update_single_site(&self, site: &WebsiteConfig) -> SiteUpdateResult {
        let max_retries = self.get_config().max_retries;
        self.update_site(site, false, max_retries).await
    }

    async fn update_site(&self, site: &WebsiteConfig, force: bool, max_retries: u32) -> SiteUpdateResult {
        let started = Instant::now();

        let previous = if force {
            None
        } else {
            match self.inner.store.load_snapshot(&site.id) {
                Ok(previous) => previous,
                Err(e) => {
                    tracing::error!("Failed to load previous snapshot of {}: {}", site.name, e);
                    return failed_site(site, format!("state storage failed: {e}"), 0, started);
                }
            }
        };

        let attempts = max_retries.saturating_add(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=attempts {
            let snapshot = self.inner.source.fetch_sitemap(site).await;

            if snapshot.is_success() {
                return self.apply_snapshot(site, previous.as_ref(), snapshot, attempt, started);
            }

            last_error = snapshot
                .error_message
                .unwrap_or_else(|| "unknown sitemap error".to_string());
            tracing::warn!(
                "Update of {} failed (attempt {}/{}): {}",
                site.name,
                attempt,
                attempts,
                last_error
            );

            if attempt < attempts {
                tokio::time::sleep(self.inner.retry_base.saturating_mul(attempt)).await;
            }
        }

        tracing::error!("Giving up on {} after {} attempt(s)", site.name, attempts);
        failed_site(site, last_error, attempts, started)
    }

    fn apply_snapshot(
        &self,
        site: &WebsiteConfig,
        previous: Option<&SitemapSnapshot>,
        snapshot: SitemapSnapshot,
        attempts: u32,
        started: Instant,
    ) -> SiteUpdateResult {
        let old_urls = previous.map(|p| p.urls.as_slice()).unwrap_or(&[]);
        let diff = UrlDiff::between(old_urls, &snapshot.urls);

        if let Err(e) = self.inner.store.save_snapshot(&snapshot) {
            tracing::error!("Failed to store snapshot of {}: {}", site.name, e);
            return failed_site(site, format!("state storage failed: {e}"), attempts, started);
        }

        if diff.has_changes() {
            tracing::info!(
                "Updated {}: {} new, {} updated, {} removed URLs",
                site.name,
                diff.new_urls.len(),
                diff.updated_urls.len(),
                diff.removed_urls.len()
            );
            for url in &diff.removed_urls {
                tracing::debug!("{} no longer lists {}", site.name, url);
            }
        } else {
            tracing::info!(
                "Updated {}: sitemap unchanged ({} URLs)",
                site.name,
                diff.updated_urls.len()
            );
        }

        SiteUpdateResult {
            website_id: site.id.clone(),
            website_name: site.name.clone(),
            status: SiteStatus::Success,
            new_urls: diff.new_urls.len(),
            updated_urls: diff.updated_urls.len(),
            error: None,
            duration_ms: started.elapsed().as_millis() as u64,
            attempts,
        }
    }

    // ===== Accessors =====

    pub fn get_config(&self) -> UpdateTaskConfig {
        lock(&self.inner.config).clone()
    }

    /// Validates, persists and applies a new policy
    ///
    /// Re-arms the ticker when the scheduler is started.
    pub fn update_config(&self, config: UpdateTaskConfig) -> Result<(), SchedulerError> {
        validate_task_config(&config)?;
        self.inner.store.save_task_config(&config)?;
        *lock(&self.inner.config) = config.clone();

        if self.is_started() {
            self.rearm_ticker(&config);
        }
        tracing::info!("Scheduler config updated");
        Ok(())
    }

    /// Stored runs, newest first
    pub fn get_task_history(&self, limit: Option<usize>) -> Result<Vec<UpdateTaskResult>, SchedulerError> {
        let mut history = self.inner.store.load_history()?;
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    pub fn get_last_update_time(&self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        Ok(self.inner.store.last_update()?)
    }

    /// Progress of the active run
    pub fn get_current_task(&self) -> Option<UpdateTaskResult> {
        lock(&self.inner.active).as_ref().map(|run| run.task.clone())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    pub fn get_site_snapshot(&self, website_id: &str) -> Result<Option<SitemapSnapshot>, SchedulerError> {
        Ok(self.inner.store.load_snapshot(website_id)?)
    }

    pub fn clear_history(&self) -> Result<(), SchedulerError> {
        self.inner.store.clear_history()?;
        tracing::info!("Task history cleared");
        Ok(())
    }
}

fn failed_site(site: &WebsiteConfig, error: String, attempts: u32, started: Instant) -> SiteUpdateResult {
    SiteUpdateResult {
        website_id: site.id.clone(),
        website_name: site.name.clone(),
        status: SiteStatus::Failed,
        new_urls: 0,
        updated_urls: 0,
        error: Some(error),
        duration_ms: started.elapsed().as_millis() as u64,
        attempts,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
