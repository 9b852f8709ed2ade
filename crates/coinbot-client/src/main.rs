use tracing_subscriber::EnvFilter;

use coinbot_client::config::ClientConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::load();
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            tracing::error!("{problem}");
        }
        std::process::exit(1);
    }

    tracing::info!(lobby = %config.game.lobby, "coinbot starting");

    match coinbot_client::run_client(config).await {
        Ok(report) => tracing::info!(
            ticks = report.turn_loop.ticks,
            moves = report.turn_loop.moves_sent,
            skipped = report.turn_loop.skipped,
            snapshots = report.listener.snapshots,
            reason = ?report.turn_loop.reason,
            "Game finished"
        ),
        Err(e) => {
            tracing::error!(error = %e, "coinbot failed");
            std::process::exit(1);
        },
    }
}
