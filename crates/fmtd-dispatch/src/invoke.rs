use fmtd_common::protocol::error::{FmtdError, Result};
use fmtd_common::protocol::JobRequest;
use fmtd_common::transport::JobTransport;

/// Performs one `transform` exchange against a worker.
///
/// Opens a fresh connection, sends the input as the sole argument, awaits the
/// sole response, and drops the connection: no pooling, no retry against a
/// second candidate. The calling task is suspended until the response or a
/// connection-level error arrives.
///
/// Failure shapes, kept distinct so the caller can log them apart:
/// - [`FmtdError::Connection`]: the worker could not be reached at all;
/// - [`FmtdError::Transport`]: the exchange itself broke down;
/// - [`FmtdError::Remote`]: the worker answered, rejecting the job (usually
///   the formatter's diagnostic, carried verbatim).
pub async fn invoke_transform(addr: &str, input: &str) -> Result<String> {
    let transport = JobTransport::new();
    let mut stream = transport.connect(addr).await?;

    let request = JobRequest::transform(input);
    let response = transport.send_request(&mut stream, &request).await?;

    if response.ok {
        response.output.ok_or_else(|| {
            FmtdError::Transport("response claims success but carries no output".to_string())
        })
    } else {
        Err(FmtdError::Remote(
            response
                .error
                .unwrap_or_else(|| "worker reported an unnamed failure".to_string()),
        ))
    }
}
