//! Application initialization and configuration

use anyhow::{Context, Result};
use std::str::FromStr;
use log::{debug, LevelFilter};
use genome_plugins::{cli, config, logging, runtime::RuntimeConfig};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config.get_log_level("base", "console-level")
            .context("Invalid console-level in configuration")?
            .unwrap_or(LevelFilter::Warn)
    };

    let format = if args.log_format != "text" {
        logging::LogFormat::from_str(&args.log_format).map_err(|e| anyhow::anyhow!(e))?
    } else {
        match config.get_value("base", "log-format") {
            Some(format_str) => logging::LogFormat::from_str(format_str).map_err(|e| anyhow::anyhow!(e))?,
            None => logging::LogFormat::Text,
        }
    };

    let log_file_path = args.log_file.clone()
        .or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => config.get_log_level("base", "file-log-level")
            .context("Invalid file-log-level in configuration")?,
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), level) => {
            (logging::LogDestination::Both(file_path), Some(level.unwrap_or(console_level)))
        }
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => {
            return Err(anyhow::anyhow!("file-log-level is set but no log file is configured"));
        }
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Runtime configuration from the config file, overridden by CLI flags
pub fn build_runtime_config(args: &cli::Args, config: &config::ConfigManager) -> Result<RuntimeConfig> {
    let mut runtime_config = config.get_runtime_config()?;

    if let Some(max_concurrent) = args.max_concurrent {
        runtime_config.max_concurrent_executions = max_concurrent;
    }
    if let Some(plugin_dir) = &args.plugin_dir {
        runtime_config.plugin_dir = Some(plugin_dir.clone());
    }

    runtime_config.validate().context("Invalid runtime options")?;
    debug!("Runtime configuration: {:?}", runtime_config);
    Ok(runtime_config)
}
