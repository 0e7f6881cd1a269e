//! Wire protocol
//!
//! Channel messages are JSON objects tagged by a `type` field, one per line.
//! The participant emits `join_session`, `mouse`, `frame`, and
//! `pose_features`; the aggregator sends `telemetry` and `status` back to the
//! monitor. Payload field names follow the wire convention (`idleMs`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::session::{Role, SessionCode};
use crate::types::{PoseFeatureVector, TelemetrySnapshot};

/// Messages sent by a session participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join handshake, sent once immediately after transport connect
    JoinSession { code: SessionCode, role: Role },
    /// Pointer-activity heartbeat, 1/s
    Mouse {
        code: SessionCode,
        active: bool,
        #[serde(rename = "idleMs")]
        idle_ms: u64,
    },
    /// 320×240 JPEG frame as a base64 data URI, ~3.33/s
    Frame { code: SessionCode, image: String },
    /// Normalized pose feature vector, ≤10/s, only on valid extraction
    PoseFeatures {
        code: SessionCode,
        features: PoseFeatureVector,
    },
}

/// Messages received from the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full telemetry snapshot for the monitored participant
    Telemetry(TelemetrySnapshot),
    /// Peer presence change
    Status {
        #[serde(rename = "participantConnected")]
        participant_connected: bool,
    },
}

/// Encode one message as a newline-terminated JSON line
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, RelayError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one inbound line into a message
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, RelayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidMessage("empty line".to_string()));
    }
    Ok(serde_json::from_str(trimmed)?)
}
