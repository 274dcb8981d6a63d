//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{build_runtime_config, configure_logging, load_configuration};
pub use execution::{prepare_runtime, run_command};
