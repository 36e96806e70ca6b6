use thiserror::Error;

/// Error taxonomy for the fmtd service.
///
/// Every failure is caught at its origin, logged with context, and converted
/// into a user-facing `(no body, failure reason)` pair by the submission
/// handler. A serving task never crashes on one of these.
#[derive(Error, Debug)]
pub enum FmtdError {
    /// The directory (lease store) could not be reached or rejected a call.
    #[error("directory error: {0}")]
    Directory(String),

    /// A TCP connection to a worker could not be established.
    ///
    /// Kept distinct from [`FmtdError::Transport`] so operators can tell
    /// "couldn't reach a worker" apart from "worker rejected the job".
    #[error("connection error: {0}")]
    Connection(String),

    /// The exchange itself failed after the connection was established.
    #[error("transport error: {0}")]
    Transport(String),

    /// The worker returned an error response for the job.
    #[error("{0}")]
    Remote(String),

    /// The formatter produced a diagnostic (e.g. a syntax error in the
    /// submitted text). Displays verbatim: this is the formatter's own
    /// message and must reach the client byte for byte.
    #[error("{0}")]
    Diagnostic(String),

    /// The formatter process could not be launched at all.
    #[error("failed to launch formatter: {0}")]
    EngineSpawn(String),

    /// A request was malformed or named an unknown operation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Name generation gave up after repeated collisions in the directory.
    #[error("could not find a free worker name in the directory")]
    NameExhausted,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FmtdError>;
