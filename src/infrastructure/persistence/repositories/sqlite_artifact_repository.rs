use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ArtifactRepository, RepositoryError};
use crate::domain::{EpisodeId, JobType, MetadataFile, ProcessedFile, Transcription};

use super::query_failed;

pub struct SqliteArtifactRepository {
    pool: SqlitePool,
}

impl SqliteArtifactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|e| RepositoryError::QueryFailed(e.to_string()))
}

fn processed_file_from_row(row: &SqliteRow) -> Result<ProcessedFile, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let episode_id: String = row.try_get("episode_id").map_err(query_failed)?;
    let stage: String = row.try_get("stage").map_err(query_failed)?;
    Ok(ProcessedFile {
        id: parse_uuid(&id)?,
        episode_id: EpisodeId::from_uuid(parse_uuid(&episode_id)?),
        stage: stage
            .parse::<JobType>()
            .map_err(RepositoryError::QueryFailed)?,
        filename: row.try_get("filename").map_err(query_failed)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
    })
}

fn transcription_from_row(row: &SqliteRow) -> Result<Transcription, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let episode_id: String = row.try_get("episode_id").map_err(query_failed)?;
    let stage: String = row.try_get("stage").map_err(query_failed)?;
    Ok(Transcription {
        id: parse_uuid(&id)?,
        episode_id: EpisodeId::from_uuid(parse_uuid(&episode_id)?),
        stage: stage
            .parse::<JobType>()
            .map_err(RepositoryError::QueryFailed)?,
        filename: row.try_get("filename").map_err(query_failed)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
    })
}

fn metadata_file_from_row(row: &SqliteRow) -> Result<MetadataFile, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let episode_id: String = row.try_get("episode_id").map_err(query_failed)?;
    Ok(MetadataFile {
        id: parse_uuid(&id)?,
        episode_id: EpisodeId::from_uuid(parse_uuid(&episode_id)?),
        filename: row.try_get("filename").map_err(query_failed)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
    })
}

#[async_trait]
impl ArtifactRepository for SqliteArtifactRepository {
    #[instrument(skip(self, files))]
    async fn add_processed_files(&self, files: &[ProcessedFile]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        for file in files {
            sqlx::query(
                r#"
                INSERT INTO processed_files (id, episode_id, stage, filename, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(file.id.to_string())
            .bind(file.episode_id.as_uuid().to_string())
            .bind(file.stage.as_str())
            .bind(&file.filename)
            .bind(file.created_at)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;
        }
        tx.commit().await.map_err(query_failed)
    }

    #[instrument(skip(self, transcriptions))]
    async fn add_transcriptions(
        &self,
        transcriptions: &[Transcription],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        for transcription in transcriptions {
            sqlx::query(
                r#"
                INSERT INTO transcriptions (id, episode_id, stage, filename, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(transcription.id.to_string())
            .bind(transcription.episode_id.as_uuid().to_string())
            .bind(transcription.stage.as_str())
            .bind(&transcription.filename)
            .bind(transcription.created_at)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;
        }
        tx.commit().await.map_err(query_failed)
    }

    #[instrument(skip(self, files))]
    async fn add_metadata_files(&self, files: &[MetadataFile]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        for file in files {
            sqlx::query(
                r#"
                INSERT INTO metadata_files (id, episode_id, filename, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(file.id.to_string())
            .bind(file.episode_id.as_uuid().to_string())
            .bind(&file.filename)
            .bind(file.created_at)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;
        }
        tx.commit().await.map_err(query_failed)
    }

    #[instrument(skip(self), fields(episode_id = %episode_id, stage = %stage))]
    async fn clear_processed_files(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM processed_files WHERE episode_id = ? AND stage = ?")
            .bind(episode_id.as_uuid().to_string())
            .bind(stage.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %episode_id, stage = %stage))]
    async fn clear_transcriptions(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM transcriptions WHERE episode_id = ? AND stage = ?")
            .bind(episode_id.as_uuid().to_string())
            .bind(stage.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %episode_id))]
    async fn clear_metadata_files(&self, episode_id: EpisodeId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM metadata_files WHERE episode_id = ?")
            .bind(episode_id.as_uuid().to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %episode_id, stage = %stage))]
    async fn list_processed_files(
        &self,
        episode_id: EpisodeId,
        stage: JobType,
    ) -> Result<Vec<ProcessedFile>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM processed_files WHERE episode_id = ? AND stage = ? ORDER BY filename",
        )
        .bind(episode_id.as_uuid().to_string())
        .bind(stage.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(processed_file_from_row).collect()
    }

    #[instrument(skip(self), fields(episode_id = %episode_id))]
    async fn list_transcriptions(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<Transcription>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM transcriptions WHERE episode_id = ? ORDER BY filename")
                .bind(episode_id.as_uuid().to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(query_failed)?;

        rows.iter().map(transcription_from_row).collect()
    }

    #[instrument(skip(self), fields(episode_id = %episode_id))]
    async fn list_metadata_files(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<MetadataFile>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM metadata_files WHERE episode_id = ? ORDER BY filename")
                .bind(episode_id.as_uuid().to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(query_failed)?;

        rows.iter().map(metadata_file_from_row).collect()
    }
}
