use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use tracing::debug;

use fmtd_common::protocol::error::{FmtdError, Result};

use crate::{Directory, DirectoryEntry};

/// etcd-backed directory, speaking the v2 keyspace HTTP API.
///
/// Every call builds a fresh HTTP request; there is no connection reuse and
/// no retry; a transport failure surfaces as [`FmtdError::Directory`] and
/// the caller decides what "directory unreachable" means for it.
pub struct EtcdDirectory {
    /// Base URL of the etcd server, e.g. `http://localhost:4001`.
    base_url: String,
}

/// One node in an etcd v2 response. A directory node carries `nodes` and no
/// `value`; a leaf carries `value`.
#[derive(Debug, Deserialize)]
struct EtcdNode {
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    dir: bool,
    #[serde(default)]
    nodes: Vec<EtcdNode>,
}

#[derive(Debug, Deserialize)]
struct EtcdResponse {
    node: EtcdNode,
}

impl EtcdDirectory {
    /// Creates a client for the etcd server at `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
        }
    }

    fn keys_url(&self, key: &str) -> String {
        // The namespace is addressed as a folder; etcd wants it without the
        // trailing slash.
        let key = key.strip_suffix('/').unwrap_or(key);
        format!("{}/v2/keys{}", self.base_url, key)
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let client = Client::builder(TokioExecutor::new()).build_http();

        let response = client
            .request(request)
            .await
            .map_err(|e| FmtdError::Directory(format!("etcd request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FmtdError::Directory(format!("reading etcd response: {}", e)))?
            .to_bytes();

        Ok((status, body))
    }
}

#[async_trait]
impl Directory for EtcdDirectory {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let body = format!("value={}&ttl={}", form_encode(value), ttl.as_secs());
        let request = Request::builder()
            .method(Method::PUT)
            .uri(self.keys_url(key))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| FmtdError::Directory(format!("building etcd request: {}", e)))?;

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(FmtdError::Directory(format!(
                "etcd put of {} returned {}: {}",
                key,
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        debug!(%key, %value, ttl_secs = ttl.as_secs(), "published directory entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.keys_url(key))
            .body(Full::new(Bytes::new()))
            .map_err(|e| FmtdError::Directory(format!("building etcd request: {}", e)))?;

        let (status, body) = self.send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FmtdError::Directory(format!(
                "etcd get of {} returned {}",
                key, status
            )));
        }

        let parsed: EtcdResponse = serde_json::from_slice(&body)?;
        Ok(parsed.node.value)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.keys_url(prefix))
            .body(Full::new(Bytes::new()))
            .map_err(|e| FmtdError::Directory(format!("building etcd request: {}", e)))?;

        let (status, body) = self.send(request).await?;
        if status == StatusCode::NOT_FOUND {
            // Nobody has registered yet, so the namespace folder does not
            // exist. Same as an empty snapshot.
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(FmtdError::Directory(format!(
                "etcd list of {} returned {}",
                prefix, status
            )));
        }

        let parsed: EtcdResponse = serde_json::from_slice(&body)?;
        let entries = parsed
            .node
            .nodes
            .into_iter()
            .filter(|n| !n.dir)
            .filter_map(|n| n.value.map(|value| DirectoryEntry { key: n.key, value }))
            .collect();

        Ok(entries)
    }
}

/// Percent-encodes a form value. Registration values are `host:port` strings,
/// so this only needs to cover the URL-reserved bytes.
fn form_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_url_strips_trailing_slash() {
        let dir = EtcdDirectory::new("localhost", 4001);
        assert_eq!(
            dir.keys_url("/workers/"),
            "http://localhost:4001/v2/keys/workers"
        );
        assert_eq!(
            dir.keys_url("/workers/42"),
            "http://localhost:4001/v2/keys/workers/42"
        );
    }

    #[test]
    fn test_form_encode_passes_host_port_through() {
        assert_eq!(form_encode("10.0.0.1:54321"), "10.0.0.1:54321");
        assert_eq!(form_encode("a b&c"), "a%20b%26c");
    }

    #[test]
    fn test_parse_list_response() {
        let body = r#"{
            "action": "get",
            "node": {
                "key": "/workers",
                "dir": true,
                "nodes": [
                    {"key": "/workers/1", "value": "10.0.0.1:9000", "ttl": 18},
                    {"key": "/workers/sub", "dir": true},
                    {"key": "/workers/2", "value": "10.0.0.2:9000", "ttl": 5}
                ]
            }
        }"#;
        let parsed: EtcdResponse = serde_json::from_slice(body.as_bytes()).unwrap();
        let leaves: Vec<_> = parsed.node.nodes.iter().filter(|n| !n.dir).collect();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].value.as_deref(), Some("10.0.0.1:9000"));
    }
}
