use super::RequestId;
use serde::{Deserialize, Serialize};

/// A worker's answer to one [`JobRequest`](super::JobRequest).
///
/// At most one of `output` and `error` is populated. `error` carries the
/// formatter's diagnostic verbatim when the submitted text was rejected;
/// that case is an expected outcome, not a system fault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResponse {
    /// Request identifier this response corresponds to.
    pub id: RequestId,
    /// Transformed text (present on success).
    pub output: Option<String>,
    /// Failure reason (present on failure).
    pub error: Option<String>,
    /// Whether the job succeeded.
    pub ok: bool,
}

impl JobResponse {
    pub fn success(id: RequestId, output: impl Into<String>) -> Self {
        JobResponse {
            id,
            output: Some(output.into()),
            error: None,
            ok: true,
        }
    }

    pub fn failure(id: RequestId, error: impl Into<String>) -> Self {
        JobResponse {
            id,
            output: None,
            error: Some(error.into()),
            ok: false,
        }
    }
}
