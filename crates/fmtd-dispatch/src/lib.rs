//! fmtd Dispatcher
//!
//! Handles one client submission end to end: query the directory for live
//! workers, pick one uniformly at random, perform exactly one synchronous
//! request/response exchange against it, and fold every possible failure
//! into a single `(body, error)` pair. The three steps are strictly
//! sequential within a call; separate calls are independent.

pub mod discover;
pub mod invoke;
pub mod submit;

pub use discover::select_worker;
pub use invoke::invoke_transform;
pub use submit::{Dispatcher, Submission};
