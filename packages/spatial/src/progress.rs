//! Progress reporting for long-running spatial operations.
//!
//! Grid densification over tens of thousands of candidates reports per
//! row through [`ProgressCallback`]; callers also use it to track their own
//! multi-stage pipelines. The caller decides how (or whether) to render
//! progress.

/// Receives progress updates from long-running operations.
///
/// Implementations must be `Send + Sync` because densification evaluates
/// candidate rows on a thread pool.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

