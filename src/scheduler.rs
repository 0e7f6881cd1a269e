//! Capture scheduling
//!
//! Given an opened media source, an initialized pose estimator, and a
//! connected channel, the scheduler runs three independently paced producers
//! until stopped:
//!
//! - frame producer: every 300 ms, resample + encode the current frame;
//! - pose producer: polled at paint-cycle cadence, gated to at most one
//!   sample per 100 ms;
//! - heartbeat producer: every 1000 ms, the current pointer-activity state.
//!
//! The producers interleave cooperatively; ordering is preserved within each
//! message type but not across types. The scheduler exclusively owns the
//! shared capture state (source, gate, activity clock); nothing else mutates
//! it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::activity::{InputKind, InputMark, PointerActivity};
use crate::channel::ChannelHandle;
use crate::error::RelayError;
use crate::estimator::PoseEstimator;
use crate::features::PoseFeatureExtractor;
use crate::frame::FrameEncoder;
use crate::media::MediaSource;

/// Frame producer period
pub const FRAME_PERIOD: Duration = Duration::from_millis(300);
/// Heartbeat producer period
pub const HEARTBEAT_PERIOD: Duration = Duration::from_millis(1000);
/// Minimum spacing between pose samples (~10 samples/s ceiling)
pub const POSE_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Pose poll cadence, standing in for the display's paint cycle
const POSE_POLL_PERIOD: Duration = Duration::from_millis(16);

/// Rate gate for the pose producer.
///
/// The pose task polls far faster than it samples; the gate turns that poll
/// stream into at most one permitted sample per `min_interval`.
#[derive(Debug)]
pub struct PoseGate {
    min_interval: Duration,
    last_sample: Option<Instant>,
}

impl PoseGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sample: None,
        }
    }

    /// Whether a sample may be taken now. Granting a permit records `now`
    /// as the last sample time.
    pub fn permit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_sample {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_sample = Some(now);
        true
    }
}

/// Cloneable intake for the input events that feed the heartbeat
#[derive(Debug, Clone)]
pub struct InputHandle {
    marks: mpsc::UnboundedSender<InputMark>,
}

impl InputHandle {
    pub fn pointer_moved(&self) {
        self.send(InputKind::PointerMove);
    }

    pub fn pointer_pressed(&self) {
        self.send(InputKind::PointerPress);
    }

    pub fn key_pressed(&self) {
        self.send(InputKind::KeyPress);
    }

    fn send(&self, kind: InputKind) {
        // After stop() the intake is gone; late events are meaningless
        let _ = self.marks.send(InputMark::now(kind));
    }
}

/// Drives the three capture producers for one participant session
pub struct CaptureScheduler<M, P>
where
    M: MediaSource + 'static,
    P: PoseEstimator + 'static,
{
    source_slot: Option<M>,
    estimator_slot: Option<P>,
    shared_source: Option<Arc<Mutex<M>>>,
    channel: ChannelHandle,
    marks_tx: mpsc::UnboundedSender<InputMark>,
    marks_rx: Option<mpsc::UnboundedReceiver<InputMark>>,
    shutdown: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
    running: bool,
}

impl<M, P> CaptureScheduler<M, P>
where
    M: MediaSource + 'static,
    P: PoseEstimator + 'static,
{
    pub fn new(source: M, estimator: P, channel: ChannelHandle) -> Self {
        let (marks_tx, marks_rx) = mpsc::unbounded_channel();
        Self {
            source_slot: Some(source),
            estimator_slot: Some(estimator),
            shared_source: None,
            channel,
            marks_tx,
            marks_rx: Some(marks_rx),
            shutdown: None,
            tasks: Vec::new(),
            running: false,
        }
    }

    /// Intake handle for pointer-move / pointer-press / key-press events
    pub fn input_handle(&self) -> InputHandle {
        InputHandle {
            marks: self.marks_tx.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Acquire the media source, initialize the estimator, and begin all
    /// three producers. A no-op when already running.
    ///
    /// On acquisition or initialization failure nothing is started and the
    /// source is released; [`stop`](Self::stop) remains safe to call.
    pub async fn start(&mut self) -> Result<(), RelayError> {
        if self.running {
            return Ok(());
        }

        let mut source = self.source_slot.take().ok_or_else(|| {
            RelayError::Acquisition("capture lifecycle already ended".to_string())
        })?;

        // Suspension point: camera consent / device startup
        if let Err(e) = source.open().await {
            source.release();
            return Err(e);
        }

        let mut estimator = self
            .estimator_slot
            .take()
            .ok_or_else(|| RelayError::Estimator("estimator already consumed".to_string()))?;

        // Suspension point: model asset initialization
        if let Err(e) = estimator.initialize().await {
            source.release();
            return Err(e);
        }

        let source = Arc::new(Mutex::new(source));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let epoch = Instant::now();

        let marks_rx = self
            .marks_rx
            .take()
            .ok_or_else(|| RelayError::Acquisition("input intake already consumed".to_string()))?;

        self.tasks.push(tokio::spawn(frame_producer(
            source.clone(),
            self.channel.clone(),
            shutdown_rx.clone(),
        )));
        self.tasks.push(tokio::spawn(pose_producer(
            source.clone(),
            estimator,
            self.channel.clone(),
            shutdown_rx.clone(),
            epoch,
        )));
        self.tasks.push(tokio::spawn(heartbeat_producer(
            marks_rx,
            self.channel.clone(),
            shutdown_rx,
        )));

        self.shared_source = Some(source);
        self.shutdown = Some(shutdown_tx);
        self.running = true;
        info!(code = %self.channel.code(), "capture producers started");
        Ok(())
    }

    /// Cancel all producers, drop the input intake, and release the media
    /// source. Idempotent, and safe after a failed or partial start.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        if let Some(source) = self.shared_source.take() {
            source.lock().release();
        }
        if let Some(mut source) = self.source_slot.take() {
            source.release();
        }
        if self.running {
            info!(code = %self.channel.code(), "capture producers stopped");
        }
        self.running = false;
    }
}

async fn frame_producer(
    source: Arc<Mutex<impl MediaSource>>,
    channel: ChannelHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(FRAME_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let frame = source.lock().current_frame();
                let Some(frame) = frame else { continue };
                match FrameEncoder::encode_data_uri(&frame) {
                    Ok(image) => channel.emit_frame(image),
                    Err(e) => warn!(error = %e, "frame encoding failed, skipping sample"),
                }
            }
        }
    }
    debug!("frame producer ended");
}

async fn pose_producer(
    source: Arc<Mutex<impl MediaSource>>,
    mut estimator: impl PoseEstimator,
    channel: ChannelHandle,
    mut shutdown: watch::Receiver<bool>,
    epoch: Instant,
) {
    let mut ticker = interval(POSE_POLL_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut gate = PoseGate::new(POSE_MIN_INTERVAL);
    loop {
        // Cancellation is checked before the gate on every cycle; an
        // in-flight detect call is never interrupted.
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let now = Instant::now();
                if !gate.permit(now) {
                    continue;
                }
                let frame = source.lock().current_frame();
                let Some(frame) = frame else { continue };
                let Some(landmarks) = estimator.detect(&frame, now.duration_since(epoch)) else {
                    continue;
                };
                match PoseFeatureExtractor::extract(&landmarks) {
                    Some(features) => channel.emit_pose(features),
                    // Routine drop: subject out of frame or truncated result
                    None => debug!("dropping unusable pose sample"),
                }
            }
        }
    }
    debug!("pose producer ended");
}

async fn heartbeat_producer(
    mut marks: mpsc::UnboundedReceiver<InputMark>,
    channel: ChannelHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(HEARTBEAT_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut activity = PointerActivity::new(std::time::Instant::now());
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                while let Ok(mark) = marks.try_recv() {
                    activity.mark(mark.at);
                }
                let sample = activity.sample(std::time::Instant::now());
                channel.emit_heartbeat(sample.active, sample.idle_ms);
            }
        }
    }
    debug!("heartbeat producer ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RawFrame;
    use crate::protocol::ClientMessage;
    use crate::session::SessionCode;
    use crate::types::Landmark;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestSource {
        fail_open: bool,
        released: Arc<AtomicBool>,
    }

    #[async_trait]
    impl MediaSource for TestSource {
        async fn open(&mut self) -> Result<(), RelayError> {
            if self.fail_open {
                return Err(RelayError::Acquisition("permission denied".to_string()));
            }
            Ok(())
        }

        fn current_frame(&mut self) -> Option<RawFrame> {
            Some(RawFrame::solid(320, 240, [1, 2, 3]))
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct TestEstimator {
        fail_init: bool,
        landmark_count: usize,
    }

    #[async_trait]
    impl PoseEstimator for TestEstimator {
        async fn initialize(&mut self) -> Result<(), RelayError> {
            if self.fail_init {
                return Err(RelayError::Estimator("asset download failed".to_string()));
            }
            Ok(())
        }

        fn detect(&mut self, _frame: &RawFrame, _timestamp: Duration) -> Option<Vec<Landmark>> {
            if self.landmark_count == 0 {
                return None;
            }
            Some(vec![Landmark::with_visibility(0.1, 0.2, 0.3, 1.0); self.landmark_count])
        }
    }

    fn make_scheduler(
        fail_open: bool,
        fail_init: bool,
        landmark_count: usize,
    ) -> (
        CaptureScheduler<TestSource, TestEstimator>,
        mpsc::UnboundedReceiver<ClientMessage>,
        Arc<AtomicBool>,
    ) {
        let released = Arc::new(AtomicBool::new(false));
        let source = TestSource {
            fail_open,
            released: released.clone(),
        };
        let estimator = TestEstimator {
            fail_init,
            landmark_count,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ChannelHandle::new(SessionCode::new("AB12CD").unwrap(), tx);
        (CaptureScheduler::new(source, estimator, handle), rx, released)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ClientMessage>) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[test]
    fn test_pose_gate_limits_to_one_sample_per_window() {
        let mut gate = PoseGate::new(POSE_MIN_INTERVAL);
        let t0 = Instant::now();

        assert!(gate.permit(t0));
        assert!(!gate.permit(t0 + Duration::from_millis(50)));
        assert!(!gate.permit(t0 + Duration::from_millis(99)));
        assert!(gate.permit(t0 + Duration::from_millis(100)));
        assert!(!gate.permit(t0 + Duration::from_millis(150)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_producer_cadence() {
        let (mut scheduler, mut rx, _released) = make_scheduler(false, false, 30);
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(950)).await;
        scheduler.stop().await;

        // Ticks at 0, 300, 600, 900 ms
        let frames = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, ClientMessage::Frame { .. }))
            .count();
        assert_eq!(frames, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pose_producer_respects_gate_ceiling() {
        let (mut scheduler, mut rx, _released) = make_scheduler(false, false, 30);
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        scheduler.stop().await;

        let poses = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, ClientMessage::PoseFeatures { .. }))
            .count();
        // ~10/s ceiling; polling quantization may cost a sample or two
        assert!((8..=11).contains(&poses), "got {poses} pose samples");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_landmark_results_are_dropped_silently() {
        let (mut scheduler, mut rx, _released) = make_scheduler(false, false, 10);
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        scheduler.stop().await;

        assert!(drain(&mut rx)
            .iter()
            .all(|m| !matches!(m, ClientMessage::PoseFeatures { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_cadence_and_payload() {
        let (mut scheduler, mut rx, _released) = make_scheduler(false, false, 30);
        let input = scheduler.input_handle();
        scheduler.start().await.unwrap();
        input.pointer_moved();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.stop().await;

        let heartbeats: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Mouse { active, idle_ms, .. } => Some((active, idle_ms)),
                _ => None,
            })
            .collect();
        // Ticks at 0, 1000, 2000 ms
        assert_eq!(heartbeats.len(), 3);
        // Virtual time barely advances the real clock, so the mark keeps
        // the participant active throughout
        assert!(heartbeats.iter().all(|(active, _)| *active));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_emission_and_releases_source() {
        let (mut scheduler, mut rx, released) = make_scheduler(false, false, 30);
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(400)).await;
        scheduler.stop().await;
        assert!(released.load(Ordering::SeqCst));
        assert!(!scheduler.is_running());

        let _ = drain(&mut rx);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(drain(&mut rx).is_empty());

        // Idempotent
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_acquisition_failure_prevents_start() {
        let (mut scheduler, mut rx, released) = make_scheduler(true, false, 30);

        let result = scheduler.start().await;
        assert!(matches!(result, Err(RelayError::Acquisition(_))));
        assert!(!scheduler.is_running());
        assert!(released.load(Ordering::SeqCst));
        assert!(drain(&mut rx).is_empty());

        // stop() is safe after a failed start
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_estimator_failure_releases_source() {
        let (mut scheduler, _rx, released) = make_scheduler(false, true, 30);

        let result = scheduler.start().await;
        assert!(matches!(result, Err(RelayError::Estimator(_))));
        assert!(released.load(Ordering::SeqCst));

        scheduler.stop().await;
    }
}
