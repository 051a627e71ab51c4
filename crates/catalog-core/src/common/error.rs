//! Error types for the product catalog service.
//!
//! This module defines the central `Error` enum, which captures every
//! reportable failure in the catalog and implements `From<Error>` for
//! `tonic::Status` so handlers can propagate with `?`.
//!
//! ## Error Cases
//! - `InvalidUrl`: the ingestion URL is not a well-formed absolute URI.
//! - `UpstreamFetch`: the CSV feed could not be downloaded.
//! - `Decode`: the CSV feed was empty or malformed. Nothing was written.
//! - `Storage`: a repository query or upsert failed. An upsert may have been
//!   partially applied.
//! - `ChannelError`: an internal communication failure between tasks.
//! - `StreamClosed`: the inbound half of a stream failed.
//! - `RequestCancelled`: the client went away mid-flight.
//! - `ServiceShutdown`: the request arrived or was running while the service
//!   was shutting down.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the catalog service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The ingestion URL could not be parsed as an absolute URI.
    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// Downloading the CSV feed failed (transport error or non-success
    /// status).
    #[error("Fetch failed: {reason}")]
    UpstreamFetch { reason: String },

    /// The CSV feed was empty or contained malformed records.
    #[error("CSV decode failed: {reason}")]
    Decode { reason: String },

    /// The repository failed to read or write.
    #[error("Storage error: {context}")]
    Storage { context: String },

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// Receiving from the client's half of a stream failed.
    #[error("Stream closed: {reason}")]
    StreamClosed { reason: String },

    /// The client aborted the request.
    #[error("Request cancelled by client")]
    RequestCancelled,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    pub fn storage(context: impl ToString) -> Self {
        Self::Storage {
            context: context.to_string(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidUrl { reason } => Status::invalid_argument(reason),
            Error::UpstreamFetch { reason } => Status::not_found(reason),
            Error::Decode { reason } => Status::invalid_argument(reason),
            Error::Storage { context } => Status::unknown(context),
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::StreamClosed { reason } => Status::aborted(reason),
            Error::RequestCancelled => Status::cancelled("Request was cancelled"),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
