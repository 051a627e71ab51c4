#![doc = include_str!("../README.md")]

mod common;
pub mod filters;
pub mod pagination;

pub use common::*;
