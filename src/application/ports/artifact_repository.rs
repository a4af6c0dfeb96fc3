use async_trait::async_trait;

use crate::domain::{EpisodeId, JobType, MetadataFile, ProcessedFile, Transcription};

use super::RepositoryError;

#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn add_processed_files(
        &self,
        files: &[ProcessedFile],
    ) -> Result<(), RepositoryError>;

    async fn add_transcriptions(
        &self,
        transcriptions: &[Transcription],
    ) -> Result<(), RepositoryError>;

    async fn add_metadata_files(
        &self,
        files: &[MetadataFile],
    ) -> Result<(), RepositoryError>;

    /// Drops a stage's rows so a re-run replaces them instead of
    /// accumulating duplicates.
    async fn clear_processed_files(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<(), RepositoryError>;

    async fn clear_transcriptions(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<(), RepositoryError>;

    async fn clear_metadata_files(&self, episode_id: EpisodeId)
        -> Result<(), RepositoryError>;

    async fn list_processed_files(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<Vec<ProcessedFile>, RepositoryError>;

    async fn list_transcriptions(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<Transcription>, RepositoryError>;

    async fn list_metadata_files(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<MetadataFile>, RepositoryError>;
}
