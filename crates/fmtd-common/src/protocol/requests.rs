use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

pub type RequestId = u64;

/// The one well-known operation a worker serves.
///
/// The protocol is a named-operation remote call with a single text argument;
/// workers dispatch on this name and reject anything else.
pub const TRANSFORM_OP: &str = "transform";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A single unit of work handed to a worker.
///
/// Exists only for the lifetime of one client-facing call. The id is for
/// log correlation only; the protocol is strictly one-shot synchronous
/// call/response with no retry or idempotency requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequest {
    pub id: RequestId,
    pub op: String,
    pub input: String,
}

impl JobRequest {
    pub fn new(op: impl Into<String>, input: impl Into<String>) -> Self {
        JobRequest {
            id: generate_request_id(),
            op: op.into(),
            input: input.into(),
        }
    }

    /// Convenience constructor for the transform operation.
    pub fn transform(input: impl Into<String>) -> Self {
        Self::new(TRANSFORM_OP, input)
    }
}

fn generate_request_id() -> RequestId {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let counter = REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst);

    // Upper 32 bits from the clock, lower 32 from the counter, so ids stay
    // unique within a process even when created in the same nanosecond.
    (timestamp & 0xFFFFFFFF00000000) | (counter & 0xFFFFFFFF)
}
