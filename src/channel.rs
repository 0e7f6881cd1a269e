//! Session channel
//!
//! Owns the bidirectional connection for one session participant: the join
//! handshake, fire-and-forget outbound emission, and inbound telemetry
//! delivery. Messages are newline-delimited JSON over TCP; framing beyond
//! that (queueing under saturation, delivery guarantees) belongs to the
//! transport layer, not this crate.
//!
//! There is no reconnection policy. A dropped connection surfaces as
//! [`ChannelEvent::Closed`]; callers re-invoke [`SessionChannel::connect`].

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RelayError;
use crate::protocol::{decode_line, encode_line, ClientMessage, ServerMessage};
use crate::session::{Role, SessionCode};
use crate::types::{PoseFeatureVector, TelemetrySnapshot};

/// Events surfaced by the inbound side of a channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A full telemetry snapshot arrived
    Telemetry(TelemetrySnapshot),
    /// The aggregator reported a peer presence change
    PeerStatus { participant_connected: bool },
    /// The connection ended; `reason` is set for transport errors, `None`
    /// for a clean remote close
    Closed { reason: Option<String> },
}

/// Cloneable fire-and-forget emitter bound to one session code.
///
/// Emission never blocks and never fails upward: once the connection is
/// gone, outbound messages are dropped with a debug log.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    code: SessionCode,
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelHandle {
    pub(crate) fn new(code: SessionCode, outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self { code, outbound }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Emit one encoded frame sample
    pub fn emit_frame(&self, image: String) {
        self.emit(ClientMessage::Frame {
            code: self.code.clone(),
            image,
        });
    }

    /// Emit one pose feature vector
    pub fn emit_pose(&self, features: PoseFeatureVector) {
        self.emit(ClientMessage::PoseFeatures {
            code: self.code.clone(),
            features,
        });
    }

    /// Emit one pointer-activity heartbeat
    pub fn emit_heartbeat(&self, active: bool, idle_ms: u64) {
        self.emit(ClientMessage::Mouse {
            code: self.code.clone(),
            active,
            idle_ms,
        });
    }

    fn emit(&self, message: ClientMessage) {
        if self.outbound.send(message).is_err() {
            debug!(code = %self.code, "channel closed, dropping outbound message");
        }
    }
}

/// One logical connection per participant for the session's duration
pub struct SessionChannel {
    id: Uuid,
    role: Role,
    handle: ChannelHandle,
    events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
}

impl SessionChannel {
    /// Establish the transport connection and send the join handshake.
    ///
    /// The channel reports connected only once the handshake is on the
    /// wire, not merely after the transport-level connect.
    pub async fn connect(
        endpoint: &str,
        code: SessionCode,
        role: Role,
    ) -> Result<Self, RelayError> {
        let stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| RelayError::Connection(format!("{endpoint}: {e}")))?;
        let _ = stream.set_nodelay(true);
        let (read_half, mut write_half) = stream.into_split();

        let id = Uuid::new_v4();

        let join = ClientMessage::JoinSession {
            code: code.clone(),
            role,
        };
        let line = encode_line(&join)?;
        write_half
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RelayError::Connection(format!("join handshake failed: {e}")))?;
        write_half
            .flush()
            .await
            .map_err(|e| RelayError::Connection(format!("join handshake failed: {e}")))?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(writer_loop(id, write_half, outbound_rx));
        tokio::spawn(reader_loop(id, read_half, event_tx));

        info!(%id, code = %code, role = role.as_str(), "session channel connected");

        Ok(Self {
            id,
            role,
            handle: ChannelHandle::new(code, outbound_tx),
            events: Some(event_rx),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn code(&self) -> &SessionCode {
        self.handle.code()
    }

    /// True once the handshake went out and the writer is still alive
    pub fn is_connected(&self) -> bool {
        !self.handle.outbound.is_closed()
    }

    /// Cloneable emitter for the capture producers
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    pub fn emit_frame(&self, image: String) {
        self.handle.emit_frame(image);
    }

    pub fn emit_pose(&self, features: PoseFeatureVector) {
        self.handle.emit_pose(features);
    }

    pub fn emit_heartbeat(&self, active: bool, idle_ms: u64) {
        self.handle.emit_heartbeat(active, idle_ms);
    }

    /// Take the inbound event receiver. Available once.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        self.events.take()
    }

    /// Register a callback invoked once per inbound telemetry message.
    ///
    /// Consumes the inbound event stream; fails if it was already taken via
    /// [`events`](Self::events).
    pub fn on_telemetry<F>(&mut self, mut handler: F) -> Result<(), RelayError>
    where
        F: FnMut(TelemetrySnapshot) + Send + 'static,
    {
        let mut events = self.events.take().ok_or(RelayError::NotConnected)?;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let ChannelEvent::Telemetry(snapshot) = event {
                    handler(snapshot);
                }
            }
        });
        Ok(())
    }
}

async fn writer_loop(
    id: Uuid,
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
) {
    while let Some(message) = outbound.recv().await {
        let line = match encode_line(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!(%id, error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            warn!(%id, error = %e, "outbound write failed, closing writer");
            break;
        }
    }
    debug!(%id, "writer loop ended");
}

async fn reader_loop(
    id: Uuid,
    read_half: OwnedReadHalf,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();
    let reason = loop {
        match lines.next_line().await {
            Ok(Some(line)) => match decode_line::<ServerMessage>(&line) {
                Ok(ServerMessage::Telemetry(snapshot)) => {
                    if events.send(ChannelEvent::Telemetry(snapshot)).is_err() {
                        break None;
                    }
                }
                Ok(ServerMessage::Status {
                    participant_connected,
                }) => {
                    if events
                        .send(ChannelEvent::PeerStatus {
                            participant_connected,
                        })
                        .is_err()
                    {
                        break None;
                    }
                }
                Err(e) => {
                    warn!(%id, error = %e, "skipping malformed inbound line");
                }
            },
            Ok(None) => break None,
            Err(e) => break Some(e.to_string()),
        }
    };

    if reason.is_some() {
        warn!(%id, ?reason, "session channel closed");
    } else {
        info!(%id, "session channel closed");
    }
    let _ = events.send(ChannelEvent::Closed { reason });
}
