mod server;
mod simulator;

use clap::Parser;
use scale_config::{parse_config_from_file, ScaleConfig};
use scale_metrics::{CapabilityGate, EventSink, MetricCatalog, MetricProvider};
use server::AppState;
use simulator::SimulatorConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "scale-exporter")]
#[command(about = "Serve build scalability metrics fed by a simulated host", long_about = None)]
#[command(version)]
struct Cli {
    /// Metrics config file (YAML, TOML, or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the HTTP endpoints
    #[arg(short, long, default_value_t = 9464)]
    port: u16,

    /// Number of simulated load generators
    #[arg(short, long, default_value_t = 3)]
    generators: usize,

    /// Seed for the simulated host
    #[arg(long)]
    seed: Option<u64>,

    /// Serve metrics without generating any events
    #[arg(long)]
    no_simulation: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => parse_config_from_file(path).await?,
        None => ScaleConfig::default(),
    };

    let catalog = Arc::new(MetricCatalog::new());
    let gate = CapabilityGate::probe(&config.capabilities);
    let sink = Arc::new(EventSink::new(catalog.clone(), gate, &config)?);

    if !cli.no_simulation {
        simulator::spawn(
            sink.clone(),
            SimulatorConfig {
                generators: cli.generators,
                seed: cli.seed,
            },
        );
    }

    let state = AppState {
        start_time: Instant::now(),
        provider: MetricProvider::new(catalog),
    };

    let addr = format!("0.0.0.0:{}", cli.port);
    info!("Starting scale exporter on {}", addr);
    info!("Endpoints:");
    info!("  GET  /health        - Health check");
    info!("  GET  /metrics       - Prometheus exposition");
    info!("  GET  /metrics.json  - JSON snapshot");
    info!("  GET  /report        - Markdown report");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
