use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engagement_monitor::remote::{self, AnalyticsClient, AnalyticsKind};
use engagement_monitor::session::{FileSessionStore, MemorySessionStore, SessionStore};
use engagement_monitor::{
    create_router, AppState, Config, SessionConfig, SessionCoordinator, StopOutcome,
    SyntheticDevices,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "engagement-monitor", version, about = "Lecture engagement monitoring")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/engagement-monitor")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Record one headless session and submit it
    Record {
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
        #[arg(long)]
        lecture: Option<String>,
        /// Keep a local copy of the recording
        #[arg(long)]
        archive_dir: Option<PathBuf>,
    },
    /// Check engagement backend reachability
    Health,
    /// Fetch an analytics product for a finished session
    Analytics {
        #[arg(value_enum)]
        kind: AnalyticsKind,
        #[arg(long)]
        session_id: String,
        /// JSON array of quiz results for reports and plans
        #[arg(long)]
        mcq_results: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Engagement Monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {:?} at {}", cfg.backend.mode, cfg.backend.base_url);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Record {
            duration_secs,
            lecture,
            archive_dir,
        } => {
            let mut cfg = cfg;
            if let Some(lecture) = lecture {
                cfg.monitor.lecture_name = lecture;
            }
            if archive_dir.is_some() {
                cfg.monitor.archive_dir = archive_dir;
            }
            record(cfg, Duration::from_secs(duration_secs)).await
        }
        Command::Health => {
            let remote = remote::from_config(&cfg.backend)?;
            let healthy = remote.health().await;
            println!("{} backend healthy: {}", remote.name(), healthy);
            Ok(())
        }
        Command::Analytics {
            kind,
            session_id,
            mcq_results,
        } => {
            let results: Vec<serde_json::Value> = match mcq_results {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {:?}", path))?;
                    serde_json::from_slice(&bytes).context("MCQ results must be a JSON array")?
                }
                None => Vec::new(),
            };

            let client = AnalyticsClient::new(&cfg.backend)?;
            let value = client.fetch(kind, &session_id, &results).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

fn session_store(cfg: &Config) -> Arc<dyn SessionStore> {
    match cfg.storage.session_file() {
        Some(path) => {
            info!("Session slot: {:?}", path);
            Arc::new(FileSessionStore::new(path))
        }
        None => {
            warn!("No data directory available, session id will not survive restarts");
            Arc::new(MemorySessionStore::new())
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let remote = remote::from_config(&cfg.backend)?;
    if !remote.health().await {
        warn!("Engagement backend not reachable yet; samples will be simulated locally");
    }

    let coordinator = Arc::new(SessionCoordinator::new(
        SessionConfig::from(&cfg.monitor),
        Arc::new(SyntheticDevices::default()),
        Arc::clone(&remote),
        session_store(&cfg),
    ));

    let app = create_router(AppState::new(Arc::clone(&coordinator), remote));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Control API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("HTTP server failed")?;

    coordinator.teardown();
    info!("Shut down");
    Ok(())
}

async fn record(cfg: Config, duration: Duration) -> Result<()> {
    let remote = remote::from_config(&cfg.backend)?;

    let coordinator = SessionCoordinator::new(
        SessionConfig::from(&cfg.monitor),
        Arc::new(SyntheticDevices::default()),
        remote,
        session_store(&cfg),
    );

    coordinator
        .start()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let mut samples = coordinator.subscribe();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = samples.changed() => {
                if changed.is_err() {
                    break;
                }
                let sample = samples.borrow_and_update().clone();
                if let Some(sample) = sample {
                    info!(
                        "[{}] {} ({}) {:?}",
                        coordinator.display().snapshot().elapsed(),
                        sample.state,
                        sample.emotion,
                        sample.source
                    );
                }
            }
        }
    }

    match coordinator.stop().await {
        StopOutcome::Submitted { session_id, report }
        | StopOutcome::Recovered { session_id, report } => {
            println!("Session {} processed", session_id);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StopOutcome::Failed { message, .. } => warn!("{}", message),
        other => info!("Recording finished: {}", other.label()),
    }

    Ok(())
}
