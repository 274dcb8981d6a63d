//! CLI module containing argument parsing and validation

pub mod args;

pub use args::{parse_args, validate_args, Args, Command};
