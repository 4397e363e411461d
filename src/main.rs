use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing::info;

mod config;
mod diagnostics;
mod logging;
mod metric;
mod model;
mod permission;
mod probe;
mod resolve;
mod server;
mod source;
mod watch;

use crate::{
    config::{Config, SourceConfig},
    diagnostics::Diagnostics,
    metric::{Metric, MetricResult},
    probe::{ProbeRunner, TcpProber},
    source::{MmcliSource, RecordSource, SnapshotSource},
};

#[derive(Debug, Parser)]
#[command(about = "Cellular signal and connectivity diagnostics")]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available metrics
    List,
    /// Measure one metric, by name or id (e.g. `rsrp`, `cell-id`, `"Packet Loss"`)
    Measure { metric: String },
    /// Print signal strength until interrupted
    Watch {
        #[arg(short, long, default_value_t = 2)]
        interval: u64,
    },
    /// Serve the metric list and details over HTTP
    Serve { port: Option<u16> },
}

fn record_source(config: &SourceConfig) -> Arc<dyn RecordSource> {
    match config {
        SourceConfig::Snapshot { path } => Arc::new(SnapshotSource::new(path)),
        SourceConfig::Mmcli { modem } => Arc::new(MmcliSource::new(modem.as_str())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let path = match cli.config.as_deref() {
        Some(x) => x,
        None => Path::new("config.toml"),
    };
    let config = config::load(path)?;

    let diagnostics = Diagnostics::new(
        Arc::new(config.permissions),
        record_source(&config.source),
        ProbeRunner::new(Arc::new(TcpProber {
            port: config.probe.port,
        })),
        config.probe.clone(),
    );

    match cli.command {
        Command::List => {
            for metric in Metric::iter() {
                println!("{:<16} {metric}", metric.id());
            }
        }

        Command::Measure { metric } => {
            let result = diagnostics.measure_named(&metric).await;
            println!("{}", diagnostics::message(&result));
        }

        Command::Watch { interval } => {
            let (subscription, mut rx) =
                match diagnostics.watch(Duration::from_secs(interval.max(1))) {
                    Ok(watch) => watch,
                    Err(e) => {
                        println!("{e}");
                        return Ok(());
                    }
                };

            loop {
                tokio::select! {
                    update = rx.recv() => match update {
                        Some(MetricResult::Value(reading)) => println!("{reading}"),
                        Some(MetricResult::Unavailable) => println!("Signal Strength: Unable to retrieve"),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            subscription.cancel();
            info!("signal watch stopped");
        }

        Command::Serve { port } => {
            server::run(diagnostics, port.unwrap_or(config.http_port)).await?;
        }
    };

    Ok(())
}
