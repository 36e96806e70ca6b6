//! fmtd Common Types and Transport
//!
//! Shared protocol and transport infrastructure for the fmtd distributed
//! formatting service. A dispatcher discovers a live worker through the
//! directory, then performs exactly one request/response exchange with it
//! using the types and transport defined here.
//!
//! # Wire format
//!
//! - **Transport**: TCP, one request per connection (the dispatcher never
//!   pools or reuses connections)
//! - **Serialization**: JSON
//! - **Message format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//! - **Max message size**: 16 MiB (a source file, not a bulk payload)

pub mod protocol;
pub mod transport;

pub use protocol::*;
