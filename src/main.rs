use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use rookery::application::services::{EpisodeService, ProcessingWorker};
use rookery::infrastructure::audio::CliAudioProcessor;
use rookery::infrastructure::observability::{init_tracing, TracingConfig};
use rookery::infrastructure::persistence::{
    create_pool, run_migrations, SqliteArtifactRepository, SqliteEpisodeRepository,
    SqliteJobRepository,
};
use rookery::infrastructure::storage::LocalMediaStore;
use rookery::presentation::{create_router, AppState, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            json_format: settings.logging.enable_json,
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections)
        .await
        .context("Failed to open database")?;
    if settings.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let episodes = Arc::new(SqliteEpisodeRepository::new(pool.clone()));
    let jobs = Arc::new(SqliteJobRepository::new(pool.clone()));
    let artifacts = Arc::new(SqliteArtifactRepository::new(pool.clone()));
    let media_store = Arc::new(
        LocalMediaStore::new(PathBuf::from(&settings.storage.root_path))
            .context("Failed to open media storage")?,
    );
    let processor = Arc::new(CliAudioProcessor::new(settings.processing.command.clone()));

    let (job_sender, job_receiver) = mpsc::channel(settings.processing.queue_capacity);

    let worker = ProcessingWorker::new(
        job_receiver,
        episodes.clone(),
        jobs.clone(),
        artifacts.clone(),
        media_store.clone(),
        processor,
    );
    tokio::spawn(worker.run());

    let episode_service = Arc::new(EpisodeService::new(
        episodes,
        jobs,
        artifacts,
        media_store,
        job_sender,
    ));

    let state = AppState {
        episode_service,
        settings: settings.clone(),
    };

    let router = create_router(state);

    let addr = SocketAddr::new(
        settings
            .server
            .host
            .parse()
            .context("Invalid server host")?,
        settings.server.port,
    );
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
