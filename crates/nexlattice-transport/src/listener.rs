use crate::error::TransportError;
use crate::sockets::MAX_DATAGRAM_LEN;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One received datagram.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Raw datagram bytes.
    pub bytes: Vec<u8>,
    /// Sender's address.
    pub from: SocketAddr,
}

/// Spawn a task that reads datagrams from `socket` and forwards them on a
/// channel until `shutdown` is triggered.
///
/// The returned receiver yields [`Inbound`] values in arrival order; the
/// task exits (dropping the sender) when `shutdown` fires or the socket
/// errors unrecoverably.
pub fn spawn_listener(
    socket: Arc<UdpSocket>,
    shutdown: CancellationToken,
) -> mpsc::Receiver<Inbound> {
    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, from)) => {
                            let bytes = buf[..len].to_vec();
                            if tx.send(Inbound { bytes, from }).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "udp recv_from failed");
                        }
                    }
                }
            }
        }
    });
    rx
}

/// Send `bytes` to one specific address.
///
/// # Errors
///
/// Returns [`TransportError::Send`] if the underlying send fails.
pub async fn send_unicast(
    socket: &UdpSocket,
    addr: SocketAddr,
    bytes: &[u8],
) -> Result<(), TransportError> {
    socket
        .send_to(bytes, addr)
        .await
        .map(|_| ())
        .map_err(|source| TransportError::Send { addr, source })
}
