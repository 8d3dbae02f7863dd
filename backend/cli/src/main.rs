use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use qmark_config::{load_and_prepare, redact, validate, QmarkConfig, ValidationReport};
use qmark_gateway::{start_server, GatewayState, ImageAnalysisService};
use qmark_media::DebugSink;
use qmark_understanding::build_model;

#[derive(Parser)]
#[command(name = "qmark")]
#[command(about = "qmark — scores handwritten question marks with a vision model")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "QMARK_CONFIG", default_value = "config/qmark.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analysis HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Validate the config and print it with secrets masked
    CheckConfig,
    /// Query a running server's health endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_and_prepare(&cli.config).await?;

    match cli.command {
        Commands::Serve { port, bind } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            qmark_logging::init_logger(&config.log);
            run_server(config).await?;
        }
        Commands::CheckConfig => {
            let report = validate(&config);
            let snapshot = redact(&serde_json::to_value(&config)?);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            for err in &report.errors {
                eprintln!("error: {err}");
            }
            if !report.is_valid() {
                bail!("{} config error(s) in {}", report.errors.len(), cli.config.display());
            }
        }
        Commands::Status => {
            let host = match config.server.bind_address.as_str() {
                "0.0.0.0" | "::" => "127.0.0.1",
                other => other,
            };
            let url = format!("http://{}:{}/health", host, config.server.port);
            match reqwest::get(&url).await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("qmark is not running on {}:{}", host, config.server.port);
                }
            }
        }
    }

    Ok(())
}

fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for err in &report.errors {
        error!(path = %err.path, message = %err.message, "Config error");
    }
}

async fn run_server(config: QmarkConfig) -> Result<()> {
    let report = validate(&config);
    log_report(&report);
    if !report.is_valid() {
        bail!("refusing to start with {} config error(s)", report.errors.len());
    }

    info!(
        port = config.server.port,
        bind = %config.server.bind_address,
        debug_dir = %config.debug.dir,
        provider = config.model.provider.as_str(),
        model = config.model.model.as_deref().unwrap_or(""),
        "Starting qmark"
    );

    let model = build_model(&config.model).context("Failed to initialize vision model")?;
    let service = ImageAnalysisService::new(model, DebugSink::new(&config.debug.dir));

    start_server(&config.server, GatewayState::new(service)).await
}
