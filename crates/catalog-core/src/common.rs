//! Types shared by the catalog server, its clients and its tests.
//!
//! - [`proto`] - generated protobuf messages and gRPC service bindings.
//! - [`types`] - domain records ([`types::Product`], [`types::ProductRecord`]).
//! - [`Error`] - the service-wide error taxonomy and its `tonic::Status`
//!   mapping.

mod convert;
mod error;
pub mod types;

pub use error::*;

/// gRPC service and message definitions generated from
/// `proto/catalog.proto`.
///
/// ## Service
///
/// - `Fetch` - unary CSV ingestion from a URL.
/// - `List` - bidirectional stream of [`proto::Filters`] in,
///   [`proto::ListResponse`] out, strictly one response per request.
pub mod proto {
    tonic::include_proto!("catalog");

    /// Encoded `FileDescriptorSet` for gRPC server reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("catalog_descriptor");
}
