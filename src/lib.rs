pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod notifications;
pub mod plugin;
pub mod runtime;
pub mod sequence;
