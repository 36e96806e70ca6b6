use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fmtd_common::protocol::error::FmtdError;
use fmtd_directory::Directory;

use crate::discover::select_worker;
use crate::invoke::invoke_transform;

/// User-visible failure when the directory is empty or unreachable.
pub const NO_WORKER_FOUND: &str = "No worker found";

/// User-visible failure when the selected worker refuses the connection.
pub const CONTACT_FAILURE: &str = "Error while contacting worker";

/// What one submission produced: the transformed text or a failure reason,
/// never both, never neither-with-success. Serializes as `Body`/`Error`
/// JSON fields with empty fields omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "Body", default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "Error", default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Submission {
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            body: String::new(),
            error: error.into(),
        }
    }
}

/// The dispatcher: one instance serves many concurrent submissions, each on
/// its own task, sharing nothing but the read-only directory handle.
pub struct Dispatcher {
    directory: Arc<dyn Directory>,
    namespace: String,
}

impl Dispatcher {
    pub fn new(directory: Arc<dyn Directory>, namespace: impl Into<String>) -> Self {
        Self {
            directory,
            namespace: namespace.into(),
        }
    }

    /// Handles one submission: discover, select, invoke, strictly in that
    /// order. Every failure at every step is caught here and folded into the
    /// returned pair; this never panics and never returns a partial result.
    pub async fn handle_submission(&self, body: &str) -> Submission {
        if body.is_empty() {
            info!("submission with empty body");
            return Submission::failure("Request body empty");
        }

        let addr = match select_worker(self.directory.as_ref(), &self.namespace).await {
            Ok(Some(addr)) => addr,
            Ok(None) => {
                info!("no worker registered in the directory");
                return Submission::failure(NO_WORKER_FOUND);
            }
            Err(e) => {
                warn!(error = %e, "directory query failed");
                return Submission::failure(NO_WORKER_FOUND);
            }
        };

        debug!(%addr, "dispatching to worker");

        match invoke_transform(&addr, body).await {
            Ok(output) => Submission::success(output),
            Err(FmtdError::Remote(reason)) => {
                // The formatter's own diagnostic; expected and frequent.
                debug!(%addr, "worker rejected the job");
                Submission::failure(reason)
            }
            Err(e @ FmtdError::Connection(_)) => {
                warn!(%addr, error = %e, "could not reach worker");
                Submission::failure(CONTACT_FAILURE)
            }
            Err(e) => {
                warn!(%addr, error = %e, "job exchange failed");
                Submission::failure(e.to_string())
            }
        }
    }
}
