pub mod error;
pub mod requests;
pub mod responses;


pub use error::{FmtdError, Result};
pub use requests::{JobRequest, RequestId, TRANSFORM_OP};
pub use responses::JobResponse;
