//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`catalog`] - [`catalog::ProductCatalog`], the facade over storage and
//!   ingestion that the transport layer talks to.
//! - [`config`] - product sort policy.
//! - [`handler`] - gRPC service entry point (`CatalogService`).

pub mod catalog;
pub mod config;
pub mod handler;
