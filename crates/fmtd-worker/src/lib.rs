//! fmtd Worker
//!
//! A worker serves `transform` jobs over TCP and advertises itself in the
//! directory so dispatchers can find it. Three pieces:
//!
//! - [`RegistrationAgent`]: picks a unique name and republishes the
//!   `name → address` lease on a fixed period, forever.
//! - [`FormatEngine`]: runs the external formatter once per job, stdin in,
//!   stdout/stderr out.
//! - [`Worker`]: dispatches inbound requests to the engine.

pub mod engine;
pub mod handler;
pub mod register;

pub use engine::FormatEngine;
pub use handler::Worker;
pub use register::{RegistrationAgent, RegistrationConfig};
