//! Session identity
//!
//! A session binds one participant channel to one monitor channel through a
//! short opaque code. Codes are created by an external registry; this module
//! only normalizes them on entry and can mint new ones for that registry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RelayError;

/// Length of generated session codes
pub const CODE_LEN: usize = 6;

/// Participant role within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sends engagement signals
    Participant,
    /// Receives telemetry snapshots
    Monitor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Monitor => "monitor",
        }
    }
}

/// Opaque short session code, case-normalized to uppercase on entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Normalize a user-entered code: trim whitespace, uppercase
    pub fn new(raw: &str) -> Result<Self, RelayError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(RelayError::InvalidCode("empty code".to_string()));
        }
        Ok(Self(normalized))
    }

    /// Mint a fresh code for the session registry
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..CODE_LEN].to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
