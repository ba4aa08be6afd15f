//! Config-driven benchmark driver.

pub mod bench_cmd;
pub mod config;

pub use config::{TargetSpec, list_functions_in_config, load_bench_config};
