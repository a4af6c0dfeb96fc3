use async_trait::async_trait;

use crate::domain::{Episode, EpisodeId, JobStatus, JobType, SourceFile};

use super::RepositoryError;

#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    /// Persists the episode together with its source file rows in one
    /// transaction.
    async fn create(
        &self,
        episode: &Episode,
        sources: &[SourceFile],
    ) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError>;

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Episode>, RepositoryError>;

    /// Writes title and editor_state, bumping updated_at.
    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError>;

    /// Writes one stage status column. `stage` must be a tracked stage.
    async fn update_stage_status(
        &self,
        id: EpisodeId,
        stage: JobType,
        status: JobStatus,
    ) -> Result<(), RepositoryError>;

    async fn list_source_files(
        &self,
        id: EpisodeId,
    ) -> Result<Vec<SourceFile>, RepositoryError>;

    /// Removes the episode row; owned rows go with it via FK cascade.
    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError>;
}
