use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

/// Genomics plugin runtime
#[derive(Parser, Debug)]
#[command(name = "gplugins")]
#[command(about = "Register, inspect and call genomics analysis plugins")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION", global = true)]
    pub config_name: Option<String>,

    /// Maximum number of plugin calls executing at once
    #[arg(long = "max-concurrent", value_name = "N", global = true)]
    pub max_concurrent: Option<usize>,

    /// Directory of plugin manifests to load
    #[arg(long = "plugin-dir", value_name = "DIR", global = true)]
    pub plugin_dir: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List callable functions
    List {
        /// List visualization plugins instead of functions
        #[arg(long)]
        visualizations: bool,

        /// Print the tool manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call a plugin function
    Call {
        /// Qualified function name
        #[arg(value_name = "PLUGIN.FUNCTION")]
        qualified_name: String,

        /// Parameter object as JSON
        #[arg(long, value_name = "JSON", default_value = "{}")]
        params: String,

        /// Print execution statistics after the call
        #[arg(long)]
        stats: bool,
    },

    /// Show plugin and runtime statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.max_concurrent == Some(0) {
        return Err(anyhow::anyhow!("--max-concurrent must be at least 1"));
    }

    if let Command::Call { qualified_name, .. } = &args.command {
        crate::plugin::parse_qualified_name(qualified_name)?;
    }

    debug!("CLI arguments validated successfully");
    Ok(())
}
