use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::application::ports::{
    ArtifactRepository, EpisodeRepository, JobRepository, MediaDir, MediaStore, MediaStoreError,
    RepositoryError,
};
use crate::domain::{
    is_safe_filename, pick_combined, Episode, EpisodeId, JobStatus, JobType, ProcessingJob,
    SourceFile,
};

use super::ProcessingMessage;

pub const MAX_TOTAL_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["wav", "m4a", "aifc", "mp4"];
const MAX_LIST_LIMIT: i64 = 100;

/// One uploaded audio file, already read out of the multipart body.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("processing worker unavailable: {0}")]
    WorkerUnavailable(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("storage error: {0}")]
    Storage(MediaStoreError),
}

/// Application facade over episodes: validation, CRUD, stage initiation,
/// and the artifact read model. The processing worker owns everything that
/// happens after a job is enqueued.
pub struct EpisodeService {
    episodes: Arc<dyn EpisodeRepository>,
    jobs: Arc<dyn JobRepository>,
    artifacts: Arc<dyn ArtifactRepository>,
    media_store: Arc<dyn MediaStore>,
    job_sender: mpsc::Sender<ProcessingMessage>,
}

impl EpisodeService {
    pub fn new(
        episodes: Arc<dyn EpisodeRepository>,
        jobs: Arc<dyn JobRepository>,
        artifacts: Arc<dyn ArtifactRepository>,
        media_store: Arc<dyn MediaStore>,
        job_sender: mpsc::Sender<ProcessingMessage>,
    ) -> Self {
        Self {
            episodes,
            jobs,
            artifacts,
            media_store,
            job_sender,
        }
    }

    pub async fn list_episodes(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Episode>, ServiceError> {
        let offset = offset.max(0);
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        Ok(self.episodes.list(offset, limit).await?)
    }

    pub async fn get_episode(&self, id: EpisodeId) -> Result<Episode, ServiceError> {
        self.episodes
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Episode not found".to_string()))
    }

    /// Validates the upload, persists the episode with its source rows,
    /// and enqueues the preprocess stage. Nothing is persisted when
    /// validation fails.
    pub async fn create_episode(
        &self,
        title: Option<String>,
        files: Vec<UploadedFile>,
    ) -> Result<Episode, ServiceError> {
        validate_upload(&files)?;

        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());

        let mut episode = Episode::new(title);
        episode.preprocess_status = JobStatus::Pending;

        let sources: Vec<SourceFile> = files
            .iter()
            .map(|f| SourceFile::new(episode.id, f.filename.clone()))
            .collect();

        for file in &files {
            if let Err(e) = self
                .media_store
                .save_source(episode.id, &file.filename, &file.data)
                .await
            {
                self.discard_episode_files(episode.id).await;
                return Err(ServiceError::Storage(e));
            }
        }

        if let Err(e) = self.episodes.create(&episode, &sources).await {
            self.discard_episode_files(episode.id).await;
            return Err(e.into());
        }

        let job = ProcessingJob::new(episode.id, JobType::Preprocess);
        self.jobs.create(&job).await?;
        self.dispatch(&job).await?;

        tracing::info!(
            episode_id = %episode.id,
            job_id = %job.id,
            files = files.len(),
            "Episode created, preprocess enqueued"
        );

        Ok(episode)
    }

    pub async fn update_episode(
        &self,
        id: EpisodeId,
        title: Option<String>,
        editor_state: Option<String>,
    ) -> Result<Episode, ServiceError> {
        let mut episode = self.get_episode(id).await?;
        if let Some(title) = title {
            episode.title = title;
        }
        if let Some(editor_state) = editor_state {
            episode.editor_state = editor_state;
        }
        episode.updated_at = Utc::now();
        self.episodes.update(&episode).await?;
        Ok(episode)
    }

    /// Cascading delete: storage subtree first, then every owned row. Any
    /// failure surfaces instead of leaving orphans silently.
    pub async fn delete_episode(&self, id: EpisodeId) -> Result<(), ServiceError> {
        let episode = self.get_episode(id).await?;
        if episode.is_busy() {
            return Err(ServiceError::Conflict(
                "Episode is processing and cannot be deleted".to_string(),
            ));
        }

        self.media_store
            .delete_episode(id)
            .await
            .map_err(ServiceError::Storage)?;
        self.episodes.delete(id).await?;

        tracing::info!(episode_id = %id, "Episode deleted");
        Ok(())
    }

    /// Starts (or retries) a stage. The predecessor stage must be
    /// COMPLETED, the stage itself must be restartable, and the episode
    /// must not already have a job in flight. No job row is created when
    /// any check fails.
    pub async fn initiate_stage(
        &self,
        id: EpisodeId,
        job_type: JobType,
    ) -> Result<ProcessingJob, ServiceError> {
        let episode = self.get_episode(id).await?;

        if let Some(active) = self.jobs.find_active_by_episode(id).await? {
            return Err(ServiceError::Conflict(format!(
                "Episode already has a {} job in progress",
                active.job_type
            )));
        }

        if let Some(prerequisite) = job_type.prerequisite() {
            match episode.stage_status(prerequisite) {
                Some(JobStatus::Completed) | None => {}
                Some(status) => {
                    return Err(ServiceError::PreconditionFailed(format!(
                        "Episode {} is not completed. Current status: {}",
                        prerequisite, status
                    )));
                }
            }
        }

        if let Some(current) = episode.stage_status(job_type) {
            if !current.can_transition_to(JobStatus::Pending) {
                return Err(ServiceError::Conflict(format!(
                    "{} stage cannot be started from status {}",
                    job_type, current
                )));
            }
        }

        let job = ProcessingJob::new(id, job_type);
        self.jobs.create(&job).await?;
        if job_type.is_tracked() {
            self.episodes
                .update_stage_status(id, job_type, JobStatus::Pending)
                .await?;
        }
        self.dispatch(&job).await?;

        tracing::info!(episode_id = %id, job_id = %job.id, job_type = %job_type, "Stage enqueued");
        Ok(job)
    }

    pub async fn list_jobs(&self, id: EpisodeId) -> Result<Vec<ProcessingJob>, ServiceError> {
        self.get_episode(id).await?;
        Ok(self.jobs.list_by_episode(id).await?)
    }

    /// Per-speaker audio produced by preprocessing, from the artifact rows
    /// the job runner registered.
    pub async fn list_preprocessed_audios(
        &self,
        id: EpisodeId,
    ) -> Result<Vec<String>, ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Preprocess)?;
        let files = self
            .artifacts
            .list_processed_files(id, JobType::Preprocess)
            .await?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    pub async fn read_preprocessed_audio(
        &self,
        id: EpisodeId,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Preprocess)?;
        if !is_safe_filename(filename) {
            return Err(ServiceError::Validation(format!(
                "Unsafe file name: {}",
                filename
            )));
        }
        self.read_media(id, MediaDir::Preprocessed, filename).await
    }

    /// The combined subtitle file written by postprocessing.
    pub async fn read_combined_srt(
        &self,
        id: EpisodeId,
    ) -> Result<(String, Vec<u8>), ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Postprocess)?;
        let files = self
            .media_store
            .list(id, MediaDir::Postprocessed, Some("srt"))
            .await
            .map_err(storage_error)?;
        let combined = pick_combined(&files)
            .ok_or_else(|| ServiceError::NotFound("SRT file not found".to_string()))?
            .to_string();
        let data = self.read_media(id, MediaDir::Postprocessed, &combined).await?;
        Ok((combined, data))
    }

    /// The combined episode audio written by postprocessing.
    pub async fn read_combined_audio(
        &self,
        id: EpisodeId,
    ) -> Result<(String, Vec<u8>), ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Postprocess)?;
        let files = self
            .media_store
            .list(id, MediaDir::Postprocessed, Some("wav"))
            .await
            .map_err(storage_error)?;
        let combined = pick_combined(&files)
            .ok_or_else(|| ServiceError::NotFound("Edited audio file not found".to_string()))?
            .to_string();
        let data = self.read_media(id, MediaDir::Postprocessed, &combined).await?;
        Ok((combined, data))
    }

    pub async fn read_chapters(&self, id: EpisodeId) -> Result<Vec<u8>, ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Metadata)?;
        self.read_media(id, MediaDir::Metadata, "chapters.md").await
    }

    pub async fn read_show_notes(&self, id: EpisodeId) -> Result<Vec<u8>, ServiceError> {
        let episode = self.get_episode(id).await?;
        require_stage_completed(&episode, JobType::Metadata)?;
        self.read_media(id, MediaDir::Metadata, "show_notes.md").await
    }

    async fn read_media(
        &self,
        id: EpisodeId,
        dir: MediaDir,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        self.media_store
            .read(id, dir, filename)
            .await
            .map_err(storage_error)
    }

    async fn dispatch(&self, job: &ProcessingJob) -> Result<(), ServiceError> {
        let message = ProcessingMessage {
            job_id: job.id,
            episode_id: job.episode_id,
            job_type: job.job_type,
        };
        if let Err(e) = self.job_sender.send(message).await {
            tracing::error!(error = %e, job_id = %job.id, "Failed to enqueue processing job");
            let note = "processing worker unavailable";
            if let Err(e) = self
                .jobs
                .update_status(job.id, JobStatus::Failed, Some(note))
                .await
            {
                tracing::error!(error = %e, job_id = %job.id, "Failed to mark job failed");
            }
            if job.job_type.is_tracked() {
                if let Err(e) = self
                    .episodes
                    .update_stage_status(job.episode_id, job.job_type, JobStatus::Failed)
                    .await
                {
                    tracing::error!(error = %e, episode_id = %job.episode_id, "Failed to mark stage failed");
                }
            }
            return Err(ServiceError::WorkerUnavailable(e.to_string()));
        }
        Ok(())
    }

    async fn discard_episode_files(&self, id: EpisodeId) {
        if let Err(e) = self.media_store.delete_episode(id).await {
            tracing::warn!(error = %e, episode_id = %id, "Failed to clean up episode files");
        }
    }
}

fn validate_upload(files: &[UploadedFile]) -> Result<(), ServiceError> {
    if files.is_empty() {
        return Err(ServiceError::Validation(
            "No audio files provided".to_string(),
        ));
    }

    let mut total: u64 = 0;
    for file in files {
        if file.filename.is_empty() {
            return Err(ServiceError::Validation("No file name provided".to_string()));
        }
        if !is_safe_filename(&file.filename) {
            return Err(ServiceError::Validation(format!(
                "Unsafe file name: {}",
                file.filename
            )));
        }
        let extension = file
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            other => {
                return Err(ServiceError::Validation(format!(
                    "Unsupported file type: .{}",
                    other.unwrap_or_default()
                )));
            }
        }
        total += file.data.len() as u64;
        if total > MAX_TOTAL_UPLOAD_BYTES {
            return Err(ServiceError::PayloadTooLarge(
                "Total files size too large: 500MB limit".to_string(),
            ));
        }
    }
    Ok(())
}

fn require_stage_completed(episode: &Episode, stage: JobType) -> Result<(), ServiceError> {
    match episode.stage_status(stage) {
        Some(JobStatus::Completed) => Ok(()),
        Some(status) => Err(ServiceError::NotFound(format!(
            "Episode {} is not completed. Current status: {}",
            stage, status
        ))),
        None => Err(ServiceError::NotFound(format!(
            "Stage {} has no artifacts",
            stage
        ))),
    }
}

fn storage_error(error: MediaStoreError) -> ServiceError {
    match error {
        MediaStoreError::NotFound(name) => {
            ServiceError::NotFound(format!("File not found: {}", name))
        }
        other => ServiceError::Storage(other),
    }
}
