//! Framed connection shared by the client and the server.
//!
//! A [`Connection`] splits its socket in two:
//!
//! - the **read half** is moved into a receive task by
//!   [`Connection::start_receiving`], which loops
//!   `read_exact(header) → read_exact(payload) → decode → emit`;
//! - the **write half** belongs to a writer task that drains a bounded
//!   queue of encoded frames. [`Connection::send`] only enqueues, so frames
//!   reach the peer in exactly the order they were sent.
//!
//! Whatever ends the connection (peer hang-up, bad frame, failed or stalled
//! write, full send queue, cancellation, or an explicit call) funnels into
//! [`Connection::disconnect`], which emits [`ConnectionEvent::Disconnected`]
//! exactly once.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use quack_protocol::{FrameHeader, Message, HEADER_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{ConnectionId, Side, TransportError};

/// Frames that may wait for the writer before the peer counts as too slow.
/// About three seconds of state broadcasts.
pub const SEND_QUEUE_CAPACITY: usize = 64;

/// Longest a single frame write may take before the peer is dropped.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Something a connection has to report to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A complete, decoded message arrived.
    Message {
        id: ConnectionId,
        message: Message,
    },
    /// The connection is gone. Sent once per connection.
    Disconnected { id: ConnectionId },
}

/// Sending side of a connection's event channel.
pub type EventSender = mpsc::UnboundedSender<ConnectionEvent>;
/// Receiving side of a connection's event channel (the single subscriber).
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// One framed TCP connection.
pub struct Connection {
    id: ConnectionId,
    side: Side,
    peer: Option<SocketAddr>,
    /// Taken by the receive task; `None` once receiving has started.
    reader: std::sync::Mutex<Option<OwnedReadHalf>>,
    /// Encoded frames waiting for the writer task.
    outbound: mpsc::Sender<Arc<[u8]>>,
    disconnected: AtomicBool,
    /// Cancelled by `disconnect()` to stop this connection's tasks.
    closed: CancellationToken,
    events: EventSender,
}

impl Connection {
    /// Wraps an already-connected stream and spawns its writer task.
    ///
    /// Sends work immediately. Nothing is read until
    /// [`start_receiving`](Self::start_receiving) is called.
    ///
    /// # Panics
    /// Outside a Tokio runtime, like `tokio::spawn`.
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        side: Side,
        events: EventSender,
    ) -> Arc<Self> {
        let peer = stream.peer_addr().ok();
        let (reader, writer) = stream.into_split();
        let (outbound, queue) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let closed = CancellationToken::new();

        Arc::new_cyclic(|this| {
            tokio::spawn(write_frames(
                this.clone(),
                id,
                writer,
                queue,
                closed.clone(),
            ));
            Self {
                id,
                side,
                peer,
                reader: std::sync::Mutex::new(Some(reader)),
                outbound,
                disconnected: AtomicBool::new(false),
                closed,
                events,
            }
        })
    }

    /// Opens a client-side connection to a server.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        events: EventSender,
    ) -> Result<Arc<Self>, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        let conn = Self::new(ConnectionId::CLIENT, stream, Side::Client, events);
        tracing::info!(peer = ?conn.peer, "connected to server");
        Ok(conn)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Whether [`disconnect`](Self::disconnect) has run.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Spawns the receive loop.
    ///
    /// The loop runs until the peer closes the socket, a frame fails to
    /// parse or decode, `cancel` fires, or the connection is disconnected
    /// from elsewhere. In every case it finishes by calling
    /// [`disconnect`](Self::disconnect). Calling this twice is a no-op for
    /// the second call.
    pub fn start_receiving(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let reader = self
            .reader
            .lock()
            .ok()
            .and_then(|mut reader| reader.take());
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let Some(mut reader) = reader else {
                tracing::warn!(id = %this.id, "receive loop already started");
                return;
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(id = %this.id, "receive loop cancelled");
                    Ok(())
                }
                _ = this.closed.cancelled() => Ok(()),
                result = this.read_frames(&mut reader) => result,
            };

            match result {
                Ok(()) => {}
                Err(TransportError::ReceiveFailed(e)) => {
                    tracing::info!(id = %this.id, error = %e, "connection lost");
                }
                Err(e) => {
                    tracing::warn!(id = %this.id, error = %e, "protocol error, dropping connection");
                }
            }

            this.disconnect();
        })
    }

    /// Reads frames until the stream ends cleanly (`Ok`) or fails (`Err`).
    async fn read_frames(&self, reader: &mut OwnedReadHalf) -> Result<(), TransportError> {
        let mut header_buf = [0u8; HEADER_LEN];
        let mut payload = Vec::new();

        loop {
            // EOF is only clean on a frame boundary.
            match reader.read(&mut header_buf[..1]).await {
                Ok(0) => {
                    tracing::debug!(id = %self.id, "peer closed connection");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => return Err(TransportError::ReceiveFailed(e)),
            }
            reader
                .read_exact(&mut header_buf[1..])
                .await
                .map_err(TransportError::ReceiveFailed)?;

            let header = FrameHeader::parse(&header_buf)?;
            if !self.side.accepts(header.kind) {
                return Err(TransportError::UnexpectedMessage(header.kind));
            }

            payload.resize(header.length as usize, 0);
            reader
                .read_exact(&mut payload)
                .await
                .map_err(TransportError::ReceiveFailed)?;

            let message = quack_protocol::decode(header.kind, &payload)?;
            tracing::trace!(id = %self.id, kind = ?header.kind, len = header.length, "frame received");

            if self
                .events
                .send(ConnectionEvent::Message {
                    id: self.id,
                    message,
                })
                .is_err()
            {
                // Nobody is listening any more; stop reading.
                return Ok(());
            }
        }
    }

    /// Encodes `message` and queues it as one frame.
    pub fn send(&self, message: &Message) -> Result<(), TransportError> {
        let frame = quack_protocol::encode(message)?;
        self.send_frame(frame.into())
    }

    /// Queues an already-encoded frame for the writer task.
    ///
    /// Never waits. Frames are written in the order they were queued.
    /// Broadcasts encode once and hand every target the same frame. A peer
    /// that has let [`SEND_QUEUE_CAPACITY`] frames pile up is disconnected
    /// and the frame is refused.
    pub fn send_frame(&self, frame: Arc<[u8]>) -> Result<(), TransportError> {
        if self.is_disconnected() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }

        match self.outbound.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(id = %self.id, "send queue full, dropping slow peer");
                self.disconnect();
                Err(TransportError::SendQueueFull(self.id.to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                self.disconnect();
                Err(TransportError::ConnectionClosed(self.id.to_string()))
            }
        }
    }

    /// Tears the connection down.
    ///
    /// Safe to call any number of times, from any task, including from
    /// inside the receive loop; only the first call has an effect.
    pub fn disconnect(&self) {
        if self
            .disconnected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        tracing::debug!(id = %self.id, "disconnecting");
        // Stops the receive loop and makes the writer close the socket.
        self.closed.cancel();

        let _ = self
            .events
            .send(ConnectionEvent::Disconnected { id: self.id });
    }
}

/// Writes queued frames in order until the connection closes.
///
/// Holds only a weak handle so a dropped connection ends the task. Frames
/// still queued when the connection closes are discarded.
async fn write_frames(
    conn: Weak<Connection>,
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::Receiver<Arc<[u8]>>,
    closed: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            frame = queue.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let failure = match time::timeout(WRITE_TIMEOUT, writer.write_all(&frame)).await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(_) => io::Error::new(io::ErrorKind::TimedOut, "peer stopped reading"),
        };
        tracing::warn!(%id, error = %failure, "send failed");
        if let Some(conn) = conn.upgrade() {
            conn.disconnect();
        }
        break;
    }

    let _ = writer.shutdown().await;
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("side", &self.side)
            .field("peer", &self.peer)
            .field("disconnected", &self.is_disconnected())
            .finish()
    }
}
