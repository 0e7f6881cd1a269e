//! Scripted capture sources for development and demos
//!
//! [`ScriptedSource`] and [`ScriptedEstimator`] stand in for a real camera
//! and pose model so the full capture path can run without hardware. Both
//! replay a [`CaptureScript`] cyclically, advancing one step per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::estimator::PoseEstimator;
use crate::frame::{RawFrame, FRAME_HEIGHT, FRAME_WIDTH};
use crate::media::MediaSource;
use crate::types::Landmark;

/// One step of a scripted capture: a solid frame tint plus the landmark set
/// the estimator reports for that frame.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub tint: [u8; 3],
    pub landmarks: Vec<Landmark>,
}

/// A cyclic sequence of capture steps
#[derive(Debug, Clone)]
pub struct CaptureScript {
    steps: Vec<ScriptStep>,
}

impl CaptureScript {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    /// A single upright seated pose, repeated forever
    pub fn upright() -> Self {
        Self::new(vec![ScriptStep {
            tint: [40, 90, 160],
            landmarks: seated_landmarks(0.0),
        }])
    }

    /// Alternates between an upright and a slouched pose
    pub fn alternating() -> Self {
        Self::new(vec![
            ScriptStep {
                tint: [40, 90, 160],
                landmarks: seated_landmarks(0.0),
            },
            ScriptStep {
                tint: [160, 90, 40],
                landmarks: seated_landmarks(0.25),
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn step(&self, cursor: usize) -> Option<&ScriptStep> {
        if self.steps.is_empty() {
            return None;
        }
        self.steps.get(cursor % self.steps.len())
    }
}

/// Synthetic 33-landmark upper-body pose.
///
/// `lean` shifts the torso landmarks sideways to mimic a posture change;
/// indices match the usual full-body landmark layout so the extractor's
/// 11..=23 window lands on shoulders through hips.
pub fn seated_landmarks(lean: f64) -> Vec<Landmark> {
    let mut landmarks = Vec::with_capacity(33);
    // Head region, unused by the extractor
    for i in 0..11 {
        let x = 0.5 + (i as f64 - 5.0) * 0.01;
        landmarks.push(Landmark::with_visibility(x, 0.2, -0.1, 0.95));
    }
    // Shoulders
    landmarks.push(Landmark::with_visibility(0.35 + lean, 0.45, 0.0, 0.99));
    landmarks.push(Landmark::with_visibility(0.65 + lean, 0.45, 0.0, 0.99));
    // Elbows, wrists, hands
    for i in 0..8 {
        let side = if i % 2 == 0 { 0.3 } else { 0.7 };
        let y = 0.55 + (i / 2) as f64 * 0.08;
        landmarks.push(Landmark::with_visibility(side + lean, y, 0.05, 0.8));
    }
    // Hips
    landmarks.push(Landmark::with_visibility(0.4 + lean * 0.5, 0.85, 0.0, 0.9));
    landmarks.push(Landmark::with_visibility(0.6 + lean * 0.5, 0.85, 0.0, 0.9));
    // Legs, below the extractor window
    for _ in 23..33 {
        landmarks.push(Landmark::with_visibility(0.5, 1.1, 0.0, 0.2));
    }
    landmarks
}

/// Media source that replays scripted frames
pub struct ScriptedSource {
    script: Arc<CaptureScript>,
    cursor: usize,
    open: bool,
}

#[async_trait]
impl MediaSource for ScriptedSource {
    async fn open(&mut self) -> Result<(), RelayError> {
        if self.script.is_empty() {
            return Err(RelayError::Acquisition(
                "capture script has no steps".to_string(),
            ));
        }
        self.open = true;
        Ok(())
    }

    fn current_frame(&mut self) -> Option<RawFrame> {
        if !self.open {
            return None;
        }
        let step = self.script.step(self.cursor)?;
        self.cursor += 1;
        Some(RawFrame::solid(FRAME_WIDTH, FRAME_HEIGHT, step.tint))
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// Pose estimator that replays scripted landmark sets
pub struct ScriptedEstimator {
    script: Arc<CaptureScript>,
    cursor: usize,
    ready: bool,
}

#[async_trait]
impl PoseEstimator for ScriptedEstimator {
    async fn initialize(&mut self) -> Result<(), RelayError> {
        self.ready = true;
        Ok(())
    }

    fn detect(&mut self, _frame: &RawFrame, _timestamp: Duration) -> Option<Vec<Landmark>> {
        if !self.ready {
            return None;
        }
        let landmarks = self.script.step(self.cursor)?.landmarks.clone();
        self.cursor += 1;
        Some(landmarks)
    }
}

/// Build a source/estimator pair replaying the same script
pub fn scripted_pair(script: CaptureScript) -> (ScriptedSource, ScriptedEstimator) {
    let script = Arc::new(script);
    (
        ScriptedSource {
            script: Arc::clone(&script),
            cursor: 0,
            open: false,
        },
        ScriptedEstimator {
            script,
            cursor: 0,
            ready: false,
        },
    )
}
