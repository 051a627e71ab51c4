//! Server-side components of the product catalog.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration.
//! - [`ingest`] - CSV feed download and decoding.
//! - [`service`] - the gRPC service and the catalog facade behind it.
//! - [`storage`] - product repositories (in-memory and SQLite).
//! - [`streaming`] - the per-stream `List` loop.
//! - [`telemetry`] - logging, tracing and metrics initialization.
//!
//! These components are wired together in the server's `main.rs`.

pub mod config;
pub mod ingest;
pub mod service;
pub mod storage;
pub mod streaming;
pub mod telemetry;
