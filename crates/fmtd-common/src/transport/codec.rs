use crate::protocol::error::Result;
use crate::protocol::{JobRequest, JobResponse};

/// JSON codec for job requests and responses.
///
/// JSON keeps the wire format debuggable with standard tools; the payload is
/// source text, so a binary encoding would buy little.
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode_request(request: &JobRequest) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(request)?)
    }

    pub fn decode_request(data: &[u8]) -> Result<JobRequest> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn encode_response(response: &JobResponse) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(response)?)
    }

    pub fn decode_response(data: &[u8]) -> Result<JobResponse> {
        Ok(serde_json::from_slice(data)?)
    }
}
