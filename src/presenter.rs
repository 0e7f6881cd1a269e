//! Telemetry presentation
//!
//! The monitoring side holds the most recent telemetry snapshot and maps it
//! to a bounded set of semantic states. Rendering is a pure function of the
//! held snapshot; each inbound message fully replaces the previous one, and
//! nothing survives a session boundary.
//!
//! One presenter serves both observed layout variants: the theme only
//! changes the rendered text, never the data handling.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::session::SessionCode;
use crate::types::{StatusColor, TelemetrySnapshot};

/// Lifecycle phase of the monitoring view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterPhase {
    /// No code has been created or joined
    NoSession,
    /// A session exists but no telemetry has arrived yet
    AwaitingData,
    /// The most recent snapshot is held
    Live,
}

/// Semantic state of a classifier indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    Engaged,
    Wavering,
    /// No data yet / classifier warming up
    WarmingUp,
    Disengaged,
}

impl From<StatusColor> for IndicatorState {
    fn from(color: StatusColor) -> Self {
        match color {
            StatusColor::Green => IndicatorState::Engaged,
            StatusColor::Yellow => IndicatorState::Wavering,
            StatusColor::Gray => IndicatorState::WarmingUp,
            StatusColor::Red => IndicatorState::Disengaged,
        }
    }
}

impl IndicatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorState::Engaged => "ENGAGED",
            IndicatorState::Wavering => "WAVERING",
            IndicatorState::WarmingUp => "WARMING UP",
            IndicatorState::Disengaged => "DISENGAGED",
        }
    }
}

/// Two-state pointer-activity indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityIndicator {
    Active,
    Idle { idle_ms: u64 },
}

/// Pure mapping of one snapshot to indicator states
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub fer: IndicatorState,
    pub fer_label: Option<String>,
    pub pose: IndicatorState,
    pub activity: ActivityIndicator,
}

impl RenderedView {
    fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            fer: snapshot.fer.color.into(),
            fer_label: snapshot.fer.label.clone(),
            pose: snapshot.pose.color.into(),
            activity: if snapshot.mouse.active {
                ActivityIndicator::Active
            } else {
                ActivityIndicator::Idle {
                    idle_ms: snapshot.mouse.idle_ms,
                }
            },
        }
    }
}

/// Rendering detail level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenterTheme {
    /// Bare indicator lines
    #[default]
    Minimal,
    /// Labels, confidence, and receipt time included
    Detailed,
}

/// Holds the latest telemetry for one monitored session
pub struct TelemetryPresenter {
    theme: PresenterTheme,
    code: Option<SessionCode>,
    snapshot: Option<TelemetrySnapshot>,
    last_update: Option<DateTime<Utc>>,
}

impl TelemetryPresenter {
    pub fn new(theme: PresenterTheme) -> Self {
        Self {
            theme,
            code: None,
            snapshot: None,
            last_update: None,
        }
    }

    pub fn theme(&self) -> PresenterTheme {
        self.theme
    }

    pub fn phase(&self) -> PresenterPhase {
        match (&self.code, &self.snapshot) {
            (None, _) => PresenterPhase::NoSession,
            (Some(_), None) => PresenterPhase::AwaitingData,
            (Some(_), Some(_)) => PresenterPhase::Live,
        }
    }

    pub fn code(&self) -> Option<&SessionCode> {
        self.code.as_ref()
    }

    pub fn snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.snapshot.as_ref()
    }

    /// Enter a session; clears any telemetry held for a previous one
    pub fn begin_session(&mut self, code: SessionCode) {
        self.code = Some(code);
        self.snapshot = None;
        self.last_update = None;
    }

    /// Leave the session; no presenter state crosses a session boundary
    pub fn end_session(&mut self) {
        self.code = None;
        self.snapshot = None;
        self.last_update = None;
    }

    /// Hold a new snapshot, fully replacing the previous one
    pub fn apply(&mut self, snapshot: TelemetrySnapshot) {
        if self.code.is_none() {
            debug!("telemetry received without a session, ignoring");
            return;
        }
        self.snapshot = Some(snapshot);
        self.last_update = Some(Utc::now());
    }

    /// Map the held snapshot to indicator states. `None` unless live.
    pub fn render(&self) -> Option<RenderedView> {
        self.snapshot.as_ref().map(RenderedView::from_snapshot)
    }

    /// Themed text rendering for the current phase
    pub fn render_lines(&self) -> Vec<String> {
        match (&self.code, &self.snapshot) {
            (None, _) => match self.theme {
                PresenterTheme::Minimal => vec!["no session".to_string()],
                PresenterTheme::Detailed => {
                    vec!["No session. Create or join one to begin monitoring.".to_string()]
                }
            },
            (Some(code), None) => match self.theme {
                PresenterTheme::Minimal => {
                    vec![format!("session {code}: waiting for data")]
                }
                PresenterTheme::Detailed => vec![
                    format!("Session code: {code}"),
                    "Waiting for participant telemetry...".to_string(),
                ],
            },
            (Some(_), Some(snapshot)) => {
                let view = RenderedView::from_snapshot(snapshot);
                match self.theme {
                    PresenterTheme::Minimal => vec![
                        format!("fer: {}", view.fer.as_str()),
                        format!("pose: {}", view.pose.as_str()),
                        match view.activity {
                            ActivityIndicator::Active => "mouse: ACTIVE".to_string(),
                            ActivityIndicator::Idle { idle_ms } => {
                                format!("mouse: IDLE ({idle_ms} ms)")
                            }
                        },
                    ],
                    PresenterTheme::Detailed => {
                        let label = view.fer_label.as_deref().unwrap_or("NO FACE");
                        let mut lines = vec![
                            format!("FER: {} ({label})", view.fer.as_str()),
                            format!("Upper body: {}", view.pose.as_str()),
                            match view.activity {
                                ActivityIndicator::Active => "Mouse: ACTIVE".to_string(),
                                ActivityIndicator::Idle { idle_ms } => {
                                    format!("Mouse: IDLE ({idle_ms} ms)")
                                }
                            },
                        ];
                        if let Some(at) = self.last_update {
                            lines.push(format!("Updated: {}", at.to_rfc3339()));
                        }
                        lines
                    }
                }
            }
        }
    }
}
