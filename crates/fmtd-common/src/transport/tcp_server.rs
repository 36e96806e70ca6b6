use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use super::MAX_MESSAGE_SIZE;
use crate::protocol::error::{FmtdError, Result};
use crate::protocol::{JobRequest, JobResponse};
use crate::transport::codec::JsonCodec;

/// Async TCP server run by each worker.
///
/// Accepts connections in a loop and spawns a task per connection, so
/// concurrent jobs run concurrently and share no request-scoped state.
/// A connection is read until the peer closes it; the dispatcher sends one
/// request per connection, so in practice each task handles one job.
pub struct JobServer {
    listener: TcpListener,
}

impl JobServer {
    /// Binds to the given address. Port 0 picks a free port; the actual
    /// bound address is available via [`JobServer::local_addr`].
    pub async fn bind(bind_addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| FmtdError::Transport(format!("failed to bind to {}: {}", bind_addr, e)))?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| FmtdError::Transport(format!("failed to get local addr: {}", e)))
    }

    /// Accept loop. Runs until the process exits.
    ///
    /// A handler error becomes a failure response to the client; it never
    /// tears down the server.
    pub async fn run_with_handler<F, Fut>(&self, handler: F) -> Result<()>
    where
        F: Fn(JobRequest) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResponse>> + Send + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            let (stream, peer_addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| FmtdError::Transport(format!("failed to accept connection: {}", e)))?;

            debug!(%peer_addr, "connection established");

            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, handler).await {
                    warn!(%peer_addr, error = %e, "connection error");
                }
            });
        }
    }
}

/// Handles one connection, processing requests until the peer closes it.
async fn handle_connection<F, Fut>(mut stream: TcpStream, handler: Arc<F>) -> Result<()>
where
    F: Fn(JobRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<JobResponse>> + Send + 'static,
{
    loop {
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Peer is done with this connection.
                return Ok(());
            }
            Err(e) => {
                return Err(FmtdError::Transport(format!("failed to read length: {}", e)));
            }
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(FmtdError::Transport(format!(
                "message too large: {} bytes (max {} bytes)",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| FmtdError::Transport(format!("failed to read data: {}", e)))?;

        let request = match JsonCodec::decode_request(&buf) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "failed to decode request");
                let error_response = JobResponse::failure(0, e.to_string());
                let _ = send_response(&mut stream, &error_response).await;
                continue;
            }
        };

        let request_id = request.id;
        let response = match handler(request).await {
            Ok(resp) => resp,
            Err(e) => JobResponse::failure(request_id, e.to_string()),
        };

        send_response(&mut stream, &response).await?;
    }
}

async fn send_response(stream: &mut TcpStream, response: &JobResponse) -> Result<()> {
    let encoded = JsonCodec::encode_response(response)?;

    let len = encoded.len() as u32;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| FmtdError::Transport(format!("failed to send response length: {}", e)))?;
    stream
        .write_all(&encoded)
        .await
        .map_err(|e| FmtdError::Transport(format!("failed to send response data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let server = JobServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }
}
