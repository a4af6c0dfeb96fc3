use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{EpisodeId, JobId, JobStatus, JobType, ProcessingJob};

use super::query_failed;

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn job_from_row(row: &SqliteRow) -> Result<ProcessingJob, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let episode_id: String = row.try_get("episode_id").map_err(query_failed)?;
    let job_type: String = row.try_get("job_type").map_err(query_failed)?;
    let status: String = row.try_get("status").map_err(query_failed)?;

    Ok(ProcessingJob {
        id: JobId::from_uuid(
            Uuid::parse_str(&id).map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        episode_id: EpisodeId::from_uuid(
            Uuid::parse_str(&episode_id)
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        job_type: job_type
            .parse::<JobType>()
            .map_err(RepositoryError::QueryFailed)?,
        status: status
            .parse::<JobStatus>()
            .map_err(RepositoryError::QueryFailed)?,
        error_message: row.try_get("error_message").map_err(query_failed)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(query_failed)?,
    })
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &ProcessingJob) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO processing_jobs
                (id, episode_id, job_type, status, error_message, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.as_uuid().to_string())
        .bind(job.episode_id.as_uuid().to_string())
        .bind(job.job_type.as_str())
        .bind(job.status.as_str())
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<ProcessingJob>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM processing_jobs WHERE id = ?")
            .bind(id.as_uuid().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self, error_message), fields(job_id = %id, status = %status))]
    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE processing_jobs SET status = ?, error_message = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(Utc::now())
        .bind(id.as_uuid().to_string())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %episode_id))]
    async fn list_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<ProcessingJob>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM processing_jobs WHERE episode_id = ? ORDER BY created_at ASC",
        )
        .bind(episode_id.as_uuid().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self), fields(episode_id = %episode_id))]
    async fn find_active_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Option<ProcessingJob>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM processing_jobs
            WHERE episode_id = ? AND status IN ('PENDING', 'PROCESSING')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(episode_id.as_uuid().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(job_from_row).transpose()
    }
}
