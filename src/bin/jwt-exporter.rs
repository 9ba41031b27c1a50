use clap::Parser;
use jwt_exporter::checker::Checker;
use jwt_exporter::cluster::KubeClient;
use jwt_exporter::observability::metrics::Metrics;
use jwt_exporter::observability::service_resources_metrics::collect_process_metrics;
use jwt_exporter::server;
use jwt_exporter::utils::config_loader;
use jwt_exporter::utils::constants::DEFAULT_CONFIG_PATH;
use jwt_exporter::utils::logging;
use anyhow::{Context, Result};
use jwt_exporter::utils::logging::LogLevel;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let exporter_config = config_loader::run(&args.config)?;
    logging::run(exporter_config.logging.as_ref(), args.log_level);
    info!(config = ?exporter_config, "Loaded configuration");

    // -------------------------------
    // 2. Metrics state, shared by the checker and the scrape endpoint
    // -------------------------------

    let metrics = Metrics::new()?;

    // -------------------------------
    // 3. Cluster client; failing to build credentials is fatal
    // -------------------------------

    let client = KubeClient::from_kubeconfig(&exporter_config.kubeconfig_path)
        .inspect_err(|e| error!(kubeconfig_path = %exporter_config.kubeconfig_path, error = %e, "Error building cluster client"))
        .context("cannot build cluster client")?;
    info!(server = %client.server(), "Starting JWT Exporter");

    // -------------------------------
    // 4. Scrape endpoint
    // -------------------------------

    let listener = server::server::bind(&exporter_config).await?;

    let checker = Checker::new(&exporter_config, client, metrics.clone());
    let checker_task = tokio::spawn(checker.run());
    let server_task = tokio::spawn(server::server::start(
        listener,
        metrics.clone(),
        exporter_config.metrics_path.clone(),
    ));
    let process_metrics = exporter_config.process_metrics;
    let process_task = tokio::spawn({
        let metrics = metrics.clone();
        async move {
            if process_metrics {
                collect_process_metrics(metrics).await
            } else {
                std::future::pending::<Result<()>>().await
            }
        }
    });

    tokio::select! {
        res = checker_task => res.context("checker task panicked")?.context("checker stopped")?,
        res = server_task => res.context("server task panicked")?.context("Encountered error while serving prometheus exporter")?,
        res = process_task => res.context("process metrics task panicked")?.context("process metrics stopped")?,
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    Ok(())
}
