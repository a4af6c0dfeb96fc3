use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::application::ports::{
    ArtifactRepository, AudioProcessor, AudioProcessorError, EpisodeRepository, JobRepository,
    MediaDir, MediaStore, MediaStoreError, RepositoryError,
};
use crate::domain::{EpisodeId, JobId, JobStatus, JobType, MetadataFile, ProcessedFile, Transcription};

/// Order of work for one enqueued stage execution.
pub struct ProcessingMessage {
    pub job_id: JobId,
    pub episode_id: EpisodeId,
    pub job_type: JobType,
}

/// The job runner. Consumes enqueued stage executions and spawns one task
/// per job, so stages of different episodes run concurrently; per-episode
/// exclusivity is enforced at enqueue time, not here.
pub struct ProcessingWorker {
    receiver: mpsc::Receiver<ProcessingMessage>,
    context: WorkerContext,
}

#[derive(Clone)]
struct WorkerContext {
    episodes: Arc<dyn EpisodeRepository>,
    jobs: Arc<dyn JobRepository>,
    artifacts: Arc<dyn ArtifactRepository>,
    media_store: Arc<dyn MediaStore>,
    processor: Arc<dyn AudioProcessor>,
}

impl ProcessingWorker {
    pub fn new(
        receiver: mpsc::Receiver<ProcessingMessage>,
        episodes: Arc<dyn EpisodeRepository>,
        jobs: Arc<dyn JobRepository>,
        artifacts: Arc<dyn ArtifactRepository>,
        media_store: Arc<dyn MediaStore>,
        processor: Arc<dyn AudioProcessor>,
    ) -> Self {
        Self {
            receiver,
            context: WorkerContext {
                episodes,
                jobs,
                artifacts,
                media_store,
                processor,
            },
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Processing worker started");
        while let Some(message) = self.receiver.recv().await {
            let context = self.context.clone();
            let span = tracing::info_span!(
                "processing_job",
                job_id = %message.job_id,
                episode_id = %message.episode_id,
                job_type = %message.job_type,
            );
            tokio::spawn(
                async move {
                    if let Err(e) = context.process_job(message).await {
                        tracing::error!(error = %e, "Processing job failed");
                    }
                }
                .instrument(span),
            );
        }
        tracing::info!("Processing worker stopped: channel closed");
    }
}

impl WorkerContext {
    async fn process_job(&self, message: ProcessingMessage) -> Result<(), WorkerError> {
        self.update_job(message.job_id, JobStatus::Processing, None)
            .await?;
        if message.job_type.is_tracked() {
            self.episodes
                .update_stage_status(message.episode_id, message.job_type, JobStatus::Processing)
                .await?;
        }

        let result = self.run_stage(&message).await;

        // Terminal order matters: artifacts are registered by run_stage,
        // the job row settles next, and the episode stage status goes
        // last. A poller that sees the stage terminal can already query
        // both the artifacts and the job outcome.
        match &result {
            Ok(()) => {
                self.update_job(message.job_id, JobStatus::Completed, None)
                    .await?;
                if message.job_type.is_tracked() {
                    self.episodes
                        .update_stage_status(
                            message.episode_id,
                            message.job_type,
                            JobStatus::Completed,
                        )
                        .await?;
                }
                tracing::info!("Stage completed");
            }
            Err(e) => {
                let error_message = e.to_string();
                self.update_job(message.job_id, JobStatus::Failed, Some(&error_message))
                    .await?;
                if message.job_type.is_tracked() {
                    self.episodes
                        .update_stage_status(
                            message.episode_id,
                            message.job_type,
                            JobStatus::Failed,
                        )
                        .await?;
                }
            }
        }

        result
    }

    async fn run_stage(&self, message: &ProcessingMessage) -> Result<(), WorkerError> {
        let episode_id = message.episode_id;
        match message.job_type {
            JobType::Preprocess => {
                let source_dir = self.media_store.dir_path(episode_id, MediaDir::Source);
                let output_dir = self
                    .media_store
                    .ensure_dir(episode_id, MediaDir::Preprocessed)
                    .await?;
                let sources = self.episodes.list_source_files(episode_id).await?;
                let reference = sources
                    .iter()
                    .find(|s| s.is_reference)
                    .map(|s| source_dir.join(&s.filename));
                self.processor
                    .preprocess(reference.as_deref(), &source_dir, &output_dir)
                    .await?;
                self.register_audio_outputs(episode_id, JobType::Preprocess, MediaDir::Preprocessed)
                    .await?;
            }
            JobType::Postprocess | JobType::AudioEdit => {
                let input_dir = self.media_store.dir_path(episode_id, MediaDir::Preprocessed);
                let output_dir = self
                    .media_store
                    .ensure_dir(episode_id, MediaDir::Postprocessed)
                    .await?;
                self.processor.postprocess(&input_dir, &output_dir).await?;
                self.register_audio_outputs(
                    episode_id,
                    JobType::Postprocess,
                    MediaDir::Postprocessed,
                )
                .await?;
            }
            JobType::Metadata => {
                let input_dir = self
                    .media_store
                    .dir_path(episode_id, MediaDir::Postprocessed);
                let output_dir = self
                    .media_store
                    .ensure_dir(episode_id, MediaDir::Metadata)
                    .await?;
                self.processor
                    .generate_metadata(&input_dir, &output_dir)
                    .await?;
                self.register_metadata_outputs(episode_id).await?;
            }
            JobType::Export => {
                let input_dir = self
                    .media_store
                    .dir_path(episode_id, MediaDir::Postprocessed);
                let output_dir = self
                    .media_store
                    .ensure_dir(episode_id, MediaDir::Export)
                    .await?;
                self.processor.export(&input_dir, &output_dir).await?;
                self.register_export_outputs(episode_id).await?;
            }
        }
        Ok(())
    }

    /// Records a stage's audio and subtitle outputs, replacing any rows a
    /// previous run of the same stage left behind.
    async fn register_audio_outputs(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
        dir: MediaDir,
    ) -> Result<(), WorkerError> {
        self.artifacts
            .clear_processed_files(episode_id, stage)
            .await?;
        self.artifacts.clear_transcriptions(episode_id, stage).await?;

        let audio = self.media_store.list(episode_id, dir, Some("wav")).await?;
        let rows: Vec<ProcessedFile> = audio
            .into_iter()
            .map(|filename| ProcessedFile::new(episode_id, stage, filename))
            .collect();
        if !rows.is_empty() {
            self.artifacts.add_processed_files(&rows).await?;
        }

        let subtitles = self.media_store.list(episode_id, dir, Some("srt")).await?;
        let rows: Vec<Transcription> = subtitles
            .into_iter()
            .map(|filename| Transcription::new(episode_id, stage, filename))
            .collect();
        if !rows.is_empty() {
            self.artifacts.add_transcriptions(&rows).await?;
        }

        Ok(())
    }

    async fn register_metadata_outputs(&self, episode_id: EpisodeId) -> Result<(), WorkerError> {
        self.artifacts.clear_metadata_files(episode_id).await?;
        let files = self
            .media_store
            .list(episode_id, MediaDir::Metadata, Some("md"))
            .await?;
        let rows: Vec<MetadataFile> = files
            .into_iter()
            .map(|filename| MetadataFile::new(episode_id, filename))
            .collect();
        if !rows.is_empty() {
            self.artifacts.add_metadata_files(&rows).await?;
        }
        Ok(())
    }

    async fn register_export_outputs(&self, episode_id: EpisodeId) -> Result<(), WorkerError> {
        self.artifacts
            .clear_processed_files(episode_id, JobType::Export)
            .await?;
        let files = self
            .media_store
            .list(episode_id, MediaDir::Export, None)
            .await?;
        let rows: Vec<ProcessedFile> = files
            .into_iter()
            .map(|filename| ProcessedFile::new(episode_id, JobType::Export, filename))
            .collect();
        if !rows.is_empty() {
            self.artifacts.add_processed_files(&rows).await?;
        }
        Ok(())
    }

    async fn update_job(
        &self,
        job_id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), WorkerError> {
        tracing::debug!(status = %status, "Job status transition");
        self.jobs
            .update_status(job_id, status, error_message)
            .await
            .map_err(WorkerError::Repository)
    }
}

#[derive(Debug, thiserror::Error)]
enum WorkerError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("storage: {0}")]
    Storage(#[from] MediaStoreError),
    #[error("{0}")]
    Processor(#[from] AudioProcessorError),
}
