use clap::Parser;
use nexlattice_node::{cli::Cli, Config, Node};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, path = %cli.config.display(), "failed to load config");
            std::process::exit(1);
        }
    };

    let node = match Node::bootstrap(config).await {
        Ok(node) => Arc::new(node),
        Err(err) => {
            tracing::error!(error = %err, "node failed to start");
            std::process::exit(1);
        }
    };

    let shutdown_node = Arc::clone(&node);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown_node.stop();
        }
    });

    node.run().await;
    tracing::info!(status = %node.status_line().await, "node stopped");
    Ok(())
}
