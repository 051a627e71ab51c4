//! Per-stream request handling for `List`.
//!
//! - [`coordinator`] - the receive/answer loop and its cancellation rules.
//! - [`processor`] - validation, query and page assembly for one request.

pub mod coordinator;
pub mod processor;
