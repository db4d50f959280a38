#![doc = include_str!("../README.md")]

mod node;

use announce::{Announcer, CancellationToken, ContentKey};
use clap::Parser;
use node::config::{CliArgs, NodeConfig};
use node::intake::{read_keys, report_stats};
use node::router::SimulatedRouter;
use node::telemetry::init_telemetry;
use tokio::io::BufReader;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = NodeConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let root = CancellationToken::new();
    let router = SimulatedRouter::new(config.router_latency, config.router_fail_every);
    let announcer: Announcer<ContentKey> =
        Announcer::new(&root, router, config.announce.clone())?;

    let intake = tokio::spawn(read_keys(
        BufReader::new(tokio::io::stdin()),
        announcer.clone(),
    ));
    let reporter = config
        .stat_interval
        .map(|every| tokio::spawn(report_stats(announcer.clone(), every)));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Stop the pipeline. Queued keys are abandoned.
    root.cancel();
    announcer.close().await;

    // 2. A pending stdin read can't be cancelled and would hold the runtime
    // open until the next line arrives.
    let stdin_blocked = !intake.is_finished();
    if !stdin_blocked {
        match intake.await {
            Ok(Ok(accepted)) => tracing::info!("Accepted {accepted} keys from stdin"),
            Ok(Err(e)) => tracing::error!("Key intake failed: {e:#}"),
            Err(e) => tracing::error!("Key intake task panicked: {e}"),
        }
    } else {
        intake.abort();
    }
    if let Some(reporter) = reporter {
        if let Err(e) = reporter.await {
            tracing::error!("Stats reporter task panicked: {e}");
        }
    }

    tracing::info!("Final announce stats: {:?}", announcer.stat());
    tracing::info!("Announcer shut down successfully");

    // 3. Flush telemetry.
    providers.shutdown();

    if stdin_blocked {
        std::process::exit(0);
    }
    Ok(())
}

fn log_startup_info(config: &NodeConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting announce node with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting announce node with {} workers",
            config.announce.num_workers
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
