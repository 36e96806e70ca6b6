use std::net::ToSocketAddrs;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::MAX_MESSAGE_SIZE;
use crate::protocol::error::{FmtdError, Result};
use crate::protocol::{JobRequest, JobResponse};
use crate::transport::codec::JsonCodec;

/// Async TCP transport used by the dispatcher.
///
/// Each job opens one fresh connection and closes it after the single
/// request/response exchange. Connections are deliberately not pooled, and
/// no timeout is enforced beyond the transport's own defaults. Callers that
/// need bounded latency wrap the call in their own timeout.
pub struct JobTransport;

impl JobTransport {
    pub fn new() -> Self {
        Self
    }

    /// Connects to a worker address.
    ///
    /// The address may resolve to multiple socket addresses; each is tried
    /// until one succeeds. Failures here are [`FmtdError::Connection`], kept
    /// distinct from failures during the exchange.
    pub async fn connect(&self, addr: &str) -> Result<TcpStream> {
        let socket_addrs = addr
            .to_socket_addrs()
            .map_err(|e| FmtdError::Connection(format!("invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect(&socket_addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(FmtdError::Connection(format!(
            "failed to connect to {}: {}",
            addr,
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "address resolved to nothing".to_string())
        )))
    }

    /// Sends one request and waits for the response.
    ///
    /// Fully synchronous from the caller's perspective: the task is suspended
    /// until a response or a connection-level error arrives.
    pub async fn send_request(
        &self,
        stream: &mut TcpStream,
        request: &JobRequest,
    ) -> Result<JobResponse> {
        let encoded = JsonCodec::encode_request(request)?;
        Self::send_message(stream, &encoded).await?;

        let response_data = Self::receive_message(stream).await?;
        JsonCodec::decode_response(&response_data)
    }

    /// Sends a length-prefixed message.
    pub async fn send_message(stream: &mut TcpStream, data: &[u8]) -> Result<()> {
        let len = data.len() as u32;

        stream
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| FmtdError::Transport(format!("writing length prefix: {}", e)))?;
        stream
            .write_all(data)
            .await
            .map_err(|e| FmtdError::Transport(format!("writing data: {}", e)))?;
        stream
            .flush()
            .await
            .map_err(|e| FmtdError::Transport(format!("flushing stream: {}", e)))?;

        Ok(())
    }

    /// Receives a length-prefixed message.
    pub async fn receive_message(stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| FmtdError::Transport(format!("reading length prefix: {}", e)))?;

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
            .map_err(|e| FmtdError::Transport(format!("reading data: {}", e)))?;

        Ok(buf)
    }
}

impl Default for JobTransport {
    fn default() -> Self {
        Self::new()
    }
}
