use tracing::{debug, error, info};

use fmtd_common::protocol::error::{FmtdError, Result};
use fmtd_common::protocol::{JobRequest, JobResponse, TRANSFORM_OP};

use crate::engine::FormatEngine;

/// Worker-side job handler: one well-known operation, one handler.
///
/// Every failure is converted into a failure response here, so a bad job never
/// takes down the serving task.
pub struct Worker {
    engine: FormatEngine,
}

impl Worker {
    pub fn new(engine: FormatEngine) -> Self {
        Self { engine }
    }

    /// Handles one inbound request.
    pub async fn handle(&self, request: JobRequest) -> Result<JobResponse> {
        if request.op != TRANSFORM_OP {
            debug!(op = %request.op, "rejecting unknown operation");
            return Ok(JobResponse::failure(
                request.id,
                format!("unknown operation: {}", request.op),
            ));
        }

        info!(id = request.id, "transform job received");

        match self.engine.format(&request.input).await {
            Ok(output) => Ok(JobResponse::success(request.id, output)),
            Err(FmtdError::Diagnostic(text)) => {
                // The formatter's own message, passed through byte for byte.
                debug!(id = request.id, "formatter rejected the input");
                Ok(JobResponse::failure(request.id, text))
            }
            Err(e) => {
                error!(id = request.id, error = %e, "formatter could not run");
                Ok(JobResponse::failure(request.id, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_worker() -> Worker {
        Worker::new(FormatEngine::new("cat"))
    }

    #[tokio::test]
    async fn test_transform_round_trip() {
        let worker = echo_worker();
        let request = JobRequest::transform("abc");
        let response = worker.handle(request.clone()).await.unwrap();

        assert!(response.ok);
        assert_eq!(response.id, request.id);
        assert_eq!(response.output.as_deref(), Some("abc"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_operation_fails() {
        let worker = echo_worker();
        let response = worker.handle(JobRequest::new("indent", "x")).await.unwrap();

        assert!(!response.ok);
        assert!(response.error.unwrap().contains("unknown operation"));
    }

    #[tokio::test]
    async fn test_diagnostic_passthrough() {
        let engine = FormatEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "cat >/dev/null; printf 'syntax error on line 1' >&2; exit 1".to_string(),
        ]);
        let worker = Worker::new(engine);

        let response = worker.handle(JobRequest::transform("{{{")).await.unwrap();

        assert!(!response.ok);
        assert!(response.output.is_none());
        assert_eq!(response.error.as_deref(), Some("syntax error on line 1"));
    }

    #[tokio::test]
    async fn test_spawn_failure_becomes_failure_response() {
        let worker = Worker::new(FormatEngine::new("/nonexistent/formatter"));
        let response = worker.handle(JobRequest::transform("x")).await.unwrap();

        assert!(!response.ok);
        assert!(response.error.unwrap().contains("failed to launch formatter"));
    }
}
