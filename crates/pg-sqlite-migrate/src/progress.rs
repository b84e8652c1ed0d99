//! Progress reporting seam.
//!
//! The pipeline increments the sink once per successfully inserted row; the
//! sink is purely observational and must never block the consumer.

/// Observer for per-row transfer progress.
pub trait ProgressSink: Send + Sync {
    fn increment(&self);
}

/// Sink that discards all progress updates.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn increment(&self) {}
}
