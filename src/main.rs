mod app;

use anyhow::Result;
use std::process;
use log::error;
use genome_plugins::{cli, display::ColourManager, logging, runtime::PluginRuntime};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let runtime_config = app::build_runtime_config(&args, &config_manager)?;
    let colours = ColourManager::from_args(args.no_color);

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async {
        let runtime = PluginRuntime::new(runtime_config);
        app::prepare_runtime(&runtime).await?;
        let result = app::run_command(&runtime, &args.command, &colours).await;
        runtime.destroy().await;
        result
    })
}
