//! Pose estimator seam
//!
//! The body-landmark model is an external collaborator. This crate drives it
//! at the pose producer's cadence and consumes only the first detected
//! pose's landmarks.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::frame::RawFrame;
use crate::types::Landmark;

/// External pose-estimation model.
///
/// `initialize` models the one-shot asynchronous wait for model assets; it
/// gates producer start alongside media acquisition. `detect` runs to
/// completion on the calling task; cancellation never interrupts an
/// in-flight call.
#[async_trait]
pub trait PoseEstimator: Send {
    /// Load model assets
    async fn initialize(&mut self) -> Result<(), RelayError>;

    /// Landmarks of the first detected pose for this frame, or `None` when
    /// no pose is present. `timestamp` is monotonic time since capture
    /// start.
    fn detect(&mut self, frame: &RawFrame, timestamp: Duration) -> Option<Vec<Landmark>>;
}
