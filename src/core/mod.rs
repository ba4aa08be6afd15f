//! Core types: record schema and environment capture.

pub mod env;
pub mod schema;
