#![doc = include_str!("../README.md")]

pub mod server;

pub use server::{
    config::{CliArgs, ServerConfig},
    service::{catalog::ProductCatalog, handler::CatalogService},
};
