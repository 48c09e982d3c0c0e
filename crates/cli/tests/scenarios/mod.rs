//! End-to-end rotation scenarios

pub mod config_file;
pub mod failures;
pub mod sample_set;
