//! Media source seam
//!
//! Camera acquisition lives outside this crate (platform capture APIs,
//! permission prompts). The scheduler only needs a handle it can open once,
//! poll for the current frame, and release unconditionally on teardown.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::frame::RawFrame;

/// A live video source feeding the capture producers.
///
/// `open` models the one-shot asynchronous wait for user consent and device
/// startup; it gates producer start. `release` must be safe to call at any
/// point after construction, including when `open` failed or never ran.
#[async_trait]
pub trait MediaSource: Send {
    /// Acquire the underlying device/stream
    async fn open(&mut self) -> Result<(), RelayError>;

    /// The most recent frame, if one is available yet
    fn current_frame(&mut self) -> Option<RawFrame>;

    /// Release all underlying tracks/devices. Idempotent.
    fn release(&mut self);
}
