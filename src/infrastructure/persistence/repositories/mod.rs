mod sqlite_artifact_repository;
mod sqlite_episode_repository;
mod sqlite_job_repository;

pub use sqlite_artifact_repository::SqliteArtifactRepository;
pub use sqlite_episode_repository::SqliteEpisodeRepository;
pub use sqlite_job_repository::SqliteJobRepository;

use crate::application::ports::RepositoryError;

pub(crate) fn query_failed(error: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(error.to_string())
}
