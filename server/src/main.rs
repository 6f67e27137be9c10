use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use othello_server::session::SessionEvent;
use othello_server::{config, PlayerRepository, PlayerStore, SessionManager};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);
const STATS_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Othello match server.
#[derive(Parser)]
#[command(name = "othello-server", about = "Runs concurrent two-player Othello matches")]
struct Cli {
    /// Directory for player records. Overrides OTHELLO_DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for daily rolling log files. Overrides OTHELLO_LOG_DIR.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_dir = cli.log_dir.or_else(config::get_log_dir);
    let _guard = init_tracing(log_dir.as_deref())?;

    tracing::info!("Starting Othello server");

    let data_dir = cli.data_dir.unwrap_or_else(config::get_data_dir);
    tracing::info!("Using data directory: {}", data_dir.display());

    let session_config = config::session_config();
    tracing::info!(
        inactivity_secs = session_config.inactivity_threshold.as_secs(),
        replay_ttl_secs = session_config.replay_ttl.as_secs(),
        "Session configuration loaded"
    );

    let store = PlayerStore::new(data_dir);
    let manager = Arc::new(SessionManager::new(store, session_config));
    let loaded = manager.load_scoreboard().await?;
    tracing::info!("Loaded {} players onto the scoreboard", loaded);

    tokio::spawn(log_events(manager.subscribe()));
    let maintenance = tokio::spawn(run_maintenance(manager.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    maintenance.abort();

    match manager.stats().await {
        Ok(stats) => tracing::info!("{}", stats.to_string().replace('\n', ", ")),
        Err(e) => tracing::warn!("Failed to read final statistics: {}", e),
    }
    Ok(())
}

/// Stderr output always; a daily rolling file as well when `log_dir` is set.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "othello-server");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(guard)
}

/// Expire archived matches every minute and reset daily counters every 24h.
async fn run_maintenance<R: PlayerRepository + 'static>(manager: Arc<SessionManager<R>>) {
    let mut prune = tokio::time::interval(PRUNE_INTERVAL);
    let mut day = tokio::time::interval(STATS_DAY);
    // Both intervals fire immediately; the first day starts now.
    day.tick().await;

    loop {
        tokio::select! {
            _ = prune.tick() => {
                manager.prune_expired().await;
            }
            _ = day.tick() => {
                manager.roll_over_stats();
            }
        }
    }
}

async fn log_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(recipients = ?event.recipients(), "{}", describe(&event)),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Event log fell behind, skipped {} events", missed)
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::MatchStarted(snap) => format!("match {} started", snap.match_id),
        SessionEvent::BoardChanged(snap) => {
            format!("match {} at move {}", snap.match_id, snap.move_count)
        }
        SessionEvent::MatchEnded(done) => {
            format!("match {} ended ({:?})", done.match_id, done.reason)
        }
        SessionEvent::RematchOffered { from, match_id, .. } => {
            format!("{} offered a rematch of {}", from, match_id)
        }
        SessionEvent::RematchRejected { by, .. } => format!("{} rejected a rematch", by),
        SessionEvent::QueueCancelled(player) => format!("{} left the queue", player),
    }
}
