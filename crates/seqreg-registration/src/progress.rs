//! Progress tracking and callbacks for registration workflows.
//!
//! Long-running pipelines report completed work units to a
//! [`ProgressTracker`]. Any callback may answer with
//! [`ProgressAction::Abort`] to stop the run cooperatively.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Progress information for a pipeline stage.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage label, e.g. `"sequence"` or `"dense"`.
    pub stage: String,
    /// Work units finished so far.
    pub completed: usize,
    /// Total work units.
    pub total: usize,
    /// Metric value of the most recent unit, when there is one.
    pub value: Option<f64>,
    /// Time elapsed since start.
    pub elapsed: Duration,
    /// Estimated remaining time.
    pub estimated_remaining: Option<Duration>,
}

impl ProgressInfo {
    pub fn new(
        stage: impl Into<String>,
        completed: usize,
        total: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            stage: stage.into(),
            completed,
            total,
            value: None,
            elapsed,
            estimated_remaining: None,
        }
    }

    /// Calculate progress percentage.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }

    /// Calculate estimated remaining time.
    pub fn calculate_remaining(&mut self) {
        if self.completed > 0 {
            let per_unit = self.elapsed.as_secs_f64() / self.completed as f64;
            let remaining = self.total.saturating_sub(self.completed);
            self.estimated_remaining = Some(Duration::from_secs_f64(per_unit * remaining as f64));
        }
    }
}

/// What a pipeline should do after reporting progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressAction {
    Continue,
    Abort,
}

/// Progress callback trait for monitoring registration progress.
pub trait ProgressCallback: Send + Sync {
    /// Called after work units complete.
    fn on_progress(&self, info: &ProgressInfo) -> ProgressAction;

    /// Called when a stage starts.
    fn on_start(&self, _stage: &str) {}

    /// Called when a stage finishes, aborted or not.
    fn on_complete(&self, _info: &ProgressInfo) {}

    /// Called when a stage fails.
    fn on_error(&self, _error: &str) {}
}

/// Console progress callback that logs to tracing.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Log every `log_interval` completed units.
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl ConsoleProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) -> ProgressAction {
        if info.completed % self.log_interval == 0 || info.completed == info.total {
            let remaining = info
                .estimated_remaining
                .map(|d| format!("{:.2}s", d.as_secs_f64()))
                .unwrap_or_else(|| "N/A".to_string());
            tracing::info!(
                "{} {}/{} ({:.1}%) | Elapsed: {:.2}s | ETA: {}",
                info.stage,
                info.completed,
                info.total,
                info.progress_percent(),
                info.elapsed.as_secs_f64(),
                remaining
            );
        }
        ProgressAction::Continue
    }

    fn on_start(&self, stage: &str) {
        tracing::info!("{} started", stage);
    }

    fn on_complete(&self, info: &ProgressInfo) {
        tracing::info!(
            "{} finished {}/{} units in {:.2}s",
            info.stage,
            info.completed,
            info.total,
            info.elapsed.as_secs_f64()
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Registration failed: {}", error);
    }
}

/// History callback that records all progress information.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded history.
    pub fn get_history(&self) -> Vec<ProgressInfo> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) -> ProgressAction {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(info.clone());
        ProgressAction::Continue
    }
}

/// Requests an abort once cancelled, or once a completion count is reached.
///
/// Clones share the same flag, so a host can keep one handle and pass
/// another to the tracker.
#[derive(Debug, Clone, Default)]
pub struct CancellationCallback {
    cancelled: Arc<AtomicBool>,
    abort_after: Option<usize>,
    reports: Arc<AtomicUsize>,
}

impl CancellationCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort as soon as `completed` units have been reported.
    pub fn abort_after(completed: usize) -> Self {
        Self {
            abort_after: Some(completed),
            ..Self::default()
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Number of progress reports seen.
    pub fn reports(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }
}

impl ProgressCallback for CancellationCallback {
    fn on_progress(&self, info: &ProgressInfo) -> ProgressAction {
        self.reports.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.abort_after {
            if info.completed >= limit {
                self.cancel();
            }
        }
        if self.is_cancelled() {
            ProgressAction::Abort
        } else {
            ProgressAction::Continue
        }
    }
}

/// Progress tracker that fans updates out to its callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    state: Arc<Mutex<TrackerState>>,
}

#[derive(Default)]
struct TrackerState {
    stage: String,
    start_time: Option<Instant>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    /// Builder form of [`ProgressTracker::add_callback`].
    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.add_callback(callback);
        self
    }

    /// Start tracking a stage.
    pub fn start(&self, stage: &str) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.stage = stage.to_string();
            state.start_time = Some(Instant::now());
        }
        for callback in &self.callbacks {
            callback.on_start(stage);
        }
    }

    /// Report progress; returns `Abort` if any callback asked to stop.
    pub fn update(&self, completed: usize, total: usize, value: Option<f64>) -> ProgressAction {
        let mut info = self.info(completed, total);
        info.value = value;
        info.calculate_remaining();

        let mut action = ProgressAction::Continue;
        for callback in &self.callbacks {
            if callback.on_progress(&info) == ProgressAction::Abort {
                action = ProgressAction::Abort;
            }
        }
        action
    }

    /// Complete tracking.
    pub fn complete(&self, completed: usize, total: usize) {
        let info = self.info(completed, total);
        for callback in &self.callbacks {
            callback.on_complete(&info);
        }
    }

    /// Report error.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }

    fn info(&self, completed: usize, total: usize) -> ProgressInfo {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = state.start_time.map(|t| t.elapsed()).unwrap_or(Duration::ZERO);
        ProgressInfo::new(state.stage.clone(), completed, total, elapsed)
    }
}
