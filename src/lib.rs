//! Engagelink - Real-time engagement-signal relay for remote tutoring
//!
//! Engagelink streams engagement telemetry from a tutoring participant to a
//! monitor over a session-coded channel: facial frames → external
//! classifiers, pose landmarks → normalized feature vectors, pointer
//! activity → idle heartbeats. The monitor side holds the aggregated
//! snapshot and renders coarse engagement indicators.
//!
//! ## Modules
//!
//! - **Capture side**: [`scheduler`] drives [`media`] / [`estimator`]
//!   sources on fixed cadences, [`features`] normalizes landmarks,
//!   [`activity`] tracks pointer idleness, [`frame`] encodes frames
//! - **Channel**: [`channel`] speaks the [`protocol`] wire format over a
//!   session identified by [`session`] codes
//! - **Monitor side**: [`presenter`] holds and renders telemetry snapshots

pub mod activity;
pub mod channel;
pub mod error;
pub mod estimator;
pub mod features;
pub mod frame;
pub mod media;
pub mod presenter;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod sim;
pub mod types;

pub use channel::{ChannelEvent, ChannelHandle, SessionChannel};
pub use error::RelayError;
pub use features::PoseFeatureExtractor;
pub use presenter::{PresenterTheme, TelemetryPresenter};
pub use scheduler::CaptureScheduler;
pub use session::{Role, SessionCode};
pub use types::{PoseFeatureVector, StatusColor, TelemetrySnapshot, FEATURE_LEN};

/// Crate version reported by the CLI
pub const ENGAGELINK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client name sent in log output and diagnostics
pub const CLIENT_NAME: &str = "engagelink";
