//! TCP transport for job requests.
//!
//! Wire format: `[4-byte length prefix as u32 big-endian] + [JSON data]`.
//! The dispatcher opens one fresh connection per job and drops it after the
//! exchange; the worker-side server accepts concurrent connections and
//! handles each on its own task.

pub mod codec;
pub mod tcp;
pub mod tcp_server;

pub use codec::JsonCodec;
pub use tcp::JobTransport;
pub use tcp_server::JobServer;

/// Maximum message size (16 MiB). A message carries one source file, so
/// anything larger than this is a protocol violation, not a real job.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

#[cfg(test)]
mod tests;
