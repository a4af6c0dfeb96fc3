use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{EpisodeRepository, RepositoryError};
use crate::domain::{Episode, EpisodeId, JobStatus, JobType, SourceFile};

use super::query_failed;

pub struct SqliteEpisodeRepository {
    pool: SqlitePool,
}

impl SqliteEpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_column(stage: JobType) -> Result<&'static str, RepositoryError> {
    match stage {
        JobType::Preprocess => Ok("preprocess_status"),
        JobType::Postprocess => Ok("postprocess_status"),
        JobType::Metadata => Ok("metadata_status"),
        JobType::Export | JobType::AudioEdit => Err(RepositoryError::ConstraintViolation(
            format!("stage {} has no status column", stage),
        )),
    }
}

fn episode_from_row(row: &SqliteRow) -> Result<Episode, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let id = Uuid::parse_str(&id).map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    let parse = |value: String| {
        value
            .parse::<JobStatus>()
            .map_err(RepositoryError::QueryFailed)
    };

    Ok(Episode {
        id: EpisodeId::from_uuid(id),
        title: row.try_get("title").map_err(query_failed)?,
        editor_state: row.try_get("editor_state").map_err(query_failed)?,
        preprocess_status: parse(row.try_get("preprocess_status").map_err(query_failed)?)?,
        postprocess_status: parse(row.try_get("postprocess_status").map_err(query_failed)?)?,
        metadata_status: parse(row.try_get("metadata_status").map_err(query_failed)?)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(query_failed)?,
    })
}

fn source_file_from_row(row: &SqliteRow) -> Result<SourceFile, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let episode_id: String = row.try_get("episode_id").map_err(query_failed)?;
    Ok(SourceFile {
        id: Uuid::parse_str(&id).map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        episode_id: EpisodeId::from_uuid(
            Uuid::parse_str(&episode_id)
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        filename: row.try_get("filename").map_err(query_failed)?,
        speaker: row.try_get("speaker").map_err(query_failed)?,
        is_reference: row.try_get("is_reference").map_err(query_failed)?,
    })
}

#[async_trait]
impl EpisodeRepository for SqliteEpisodeRepository {
    #[instrument(skip(self, episode, sources), fields(episode_id = %episode.id))]
    async fn create(
        &self,
        episode: &Episode,
        sources: &[SourceFile],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        sqlx::query(
            r#"
            INSERT INTO episodes
                (id, title, editor_state, preprocess_status, postprocess_status,
                 metadata_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(episode.id.as_uuid().to_string())
        .bind(&episode.title)
        .bind(&episode.editor_state)
        .bind(episode.preprocess_status.as_str())
        .bind(episode.postprocess_status.as_str())
        .bind(episode.metadata_status.as_str())
        .bind(episode.created_at)
        .bind(episode.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        for source in sources {
            sqlx::query(
                r#"
                INSERT INTO source_files (id, episode_id, filename, speaker, is_reference)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(source.id.to_string())
            .bind(source.episode_id.as_uuid().to_string())
            .bind(&source.filename)
            .bind(&source.speaker)
            .bind(source.is_reference)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;
        }

        tx.commit().await.map_err(query_failed)
    }

    #[instrument(skip(self), fields(episode_id = %id))]
    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
            .bind(id.as_uuid().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(episode_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Episode>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM episodes ORDER BY created_at ASC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        rows.iter().map(episode_from_row).collect()
    }

    #[instrument(skip(self, episode), fields(episode_id = %episode.id))]
    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE episodes SET title = ?, editor_state = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&episode.title)
        .bind(&episode.editor_state)
        .bind(episode.updated_at)
        .bind(episode.id.as_uuid().to_string())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(episode.id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %id, stage = %stage, status = %status))]
    async fn update_stage_status(
        &self,
        id: EpisodeId,
        stage: JobType,
        status: JobStatus,
    ) -> Result<(), RepositoryError> {
        let column = status_column(stage)?;
        let sql = format!("UPDATE episodes SET {} = ?, updated_at = ? WHERE id = ?", column);
        let result = sqlx::query(&sql)
            .bind(status.as_str())
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

    #[instrument(skip(self), fields(episode_id = %id))]
    async fn list_source_files(&self, id: EpisodeId) -> Result<Vec<SourceFile>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM source_files WHERE episode_id = ? ORDER BY filename")
            .bind(id.as_uuid().to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        rows.iter().map(source_file_from_row).collect()
    }

    #[instrument(skip(self), fields(episode_id = %id))]
    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM episodes WHERE id = ?")
            .bind(id.as_uuid().to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
