//! Progress reporting for pipeline stages.
//!
//! Library crates report through [`ProgressCallback`] and never touch a
//! terminal. The CLI plugs in an `indicatif` bar; tests and cached runs use
//! [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a running pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of units (stages or records) expected.
    fn set_total(&self, total: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Names the stage currently running.
    fn set_message(&self, msg: String);

    /// Marks the work complete with a final message.
    fn finish(&self, msg: String);
}

/// Discards all updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
