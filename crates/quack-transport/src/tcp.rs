//! TCP listener for incoming game clients.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::TransportError;

/// Listens for client sockets on a single well-known port.
///
/// Accepted streams are handed out raw; wrapping them in a
/// [`Connection`](crate::Connection) is the registry's job, because that is
/// where player ids are assigned.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Waits for and accepts the next client socket.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
        }
        tracing::debug!(%addr, "accepted TCP connection");
        Ok((stream, addr))
    }

    /// The address the listener is bound to (useful after binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}
