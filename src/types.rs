//! Core types for the engagelink pipeline
//!
//! This module defines the data structures that flow through the capture and
//! monitoring sides: raw landmarks, the fixed-length pose feature vector, and
//! the telemetry snapshot consumed by the monitor.

use serde::{Deserialize, Serialize};

/// Number of values in a pose feature vector (13 landmarks × 4 values)
pub const FEATURE_LEN: usize = 52;

/// One raw 3-D body landmark produced by the external pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Detection confidence in [0, 1]; absent is treated as 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    /// Visibility confidence, defaulting absent values to 0
    pub fn visibility_or_zero(&self) -> f64 {
        self.visibility.unwrap_or(0.0)
    }
}

/// Normalized pose feature vector of exactly [`FEATURE_LEN`] values.
///
/// The only way to obtain one is through
/// [`PoseFeatureExtractor::extract`](crate::features::PoseFeatureExtractor::extract),
/// so the length invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseFeatureVector(Vec<f64>);

impl PoseFeatureVector {
    /// Wrap a raw vector, rejecting any length other than [`FEATURE_LEN`]
    pub fn from_vec(values: Vec<f64>) -> Option<Self> {
        if values.len() != FEATURE_LEN {
            return None;
        }
        Some(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Coarse attention/quality signal computed by the external classifiers.
///
/// GRAY conventionally denotes "not yet warmed up / no data" and is
/// independent of the other three, which grade classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusColor {
    Green,
    Yellow,
    Gray,
    Red,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Green => "GREEN",
            StatusColor::Yellow => "YELLOW",
            StatusColor::Gray => "GRAY",
            StatusColor::Red => "RED",
        }
    }
}

/// Facial-expression classifier output carried in a telemetry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerReading {
    pub color: StatusColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detected: Option<bool>,
}

impl FerReading {
    pub fn from_color(color: StatusColor) -> Self {
        Self {
            color,
            label: None,
            conf: None,
            face_detected: None,
        }
    }
}

/// Posture classifier output carried in a telemetry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseReading {
    pub color: StatusColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
}

impl PoseReading {
    pub fn from_color(color: StatusColor) -> Self {
        Self {
            color,
            status: None,
            prob: None,
        }
    }
}

/// Pointer-activity state carried in a telemetry snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseReading {
    pub active: bool,
    pub idle_ms: u64,
}

/// Read-only aggregate received by the monitoring side.
///
/// Produced by the external aggregator; each inbound message fully replaces
/// the prior snapshot. This crate never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Aggregator wall-clock time, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
    pub fer: FerReading,
    pub pose: PoseReading,
    pub mouse: MouseReading,
}
