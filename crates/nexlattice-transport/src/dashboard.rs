use crate::error::TransportError;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// POST a JSON body to the observability dashboard, hand-rolling the
/// HTTP/1.1 request over a raw `TcpStream` rather than pulling in a full
/// HTTP client: this is a fire-and-forget status report to an out-of-scope
/// sink, not a protocol this node needs to negotiate content types,
/// redirects, or keep-alive with.
///
/// The response is read and discarded; failures here are never fatal to
/// the node, only logged by the caller.
///
/// # Errors
///
/// Returns [`TransportError::DashboardUnreachable`] if the connection,
/// write, or read fails or times out.
pub async fn post_json(
    host: &str,
    port: u16,
    path: &str,
    body: &[u8],
) -> Result<(), TransportError> {
    let to_err = |source: std::io::Error| TransportError::DashboardUnreachable {
        host: host.to_string(),
        port,
        source,
    };

    let connect = TcpStream::connect((host, port));
    let mut stream = timeout(CONNECT_TIMEOUT, connect)
        .await
        .map_err(|_| {
            to_err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            ))
        })?
        .map_err(to_err)?;

    let request = format!(
        "POST {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\r\n",
        len = body.len()
    );

    stream
        .write_all(request.as_bytes())
        .await
        .map_err(to_err)?;
    stream.write_all(body).await.map_err(to_err)?;
    stream.flush().await.map_err(to_err)?;

    let mut discard = [0u8; 512];
    let _ = timeout(CONNECT_TIMEOUT, stream.read(&mut discard)).await;
    Ok(())
}
