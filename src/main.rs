//! nvexporter - NVML-based Prometheus exporter
//!
//! Exposes NVIDIA GPU telemetry as a pull-based metrics endpoint. Every
//! scrape runs one fresh NVML poll cycle; there is no background loop.

use clap::Parser;
use nvexporter::cli::Cli;
use nvexporter::collector::Collector;
use nvexporter::config::Config;
use nvexporter::error::AppError;
use nvexporter::exporter::Projector;
use nvexporter::nvml::NvmlBackend;
use nvexporter::server::{self, ServerConfig};

fn main() {
    // Parse CLI arguments and resolve configuration before logging exists
    let cli = Cli::parse();
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.level.as_filter()),
    )
    .format_timestamp(None)
    .init();

    if let Err(e) = run(&config) {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), AppError> {
    let collector = Collector::new(NvmlBackend::new(), config.collect.to_collector_config());
    let mut projector = Projector::new()?;

    log::info!(
        "Export per-process utilization? {}",
        config.collect.per_process
    );

    let server_config = ServerConfig {
        listen_address: config.web.listen_address.clone(),
        telemetry_path: config.web.telemetry_path.clone(),
    };

    server::run(&server_config, &collector, &mut projector)
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Bind { .. } => {
            eprintln!();
            eprintln!("Hint: Is another exporter already listening on this address?");
            eprintln!("      Use --listen-address to pick a different one.");
        }
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Hint: Check the config file syntax, or pass --config explicitly.");
        }
        _ => {}
    }
}
