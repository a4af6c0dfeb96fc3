use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::services::{ServiceError, UploadedFile};
use crate::domain::Episode;
use crate::presentation::state::AppState;

use super::{parse_episode_id, ApiError};

#[derive(Serialize)]
pub struct EpisodeResponse {
    pub id: String,
    pub title: String,
    pub editor_state: String,
    pub preprocess_status: String,
    pub postprocess_status: String,
    pub metadata_status: String,
    pub current_step: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Episode> for EpisodeResponse {
    fn from(episode: Episode) -> Self {
        Self {
            id: episode.id.to_string(),
            title: episode.title.clone(),
            editor_state: episode.editor_state.clone(),
            preprocess_status: episode.preprocess_status.as_str().to_string(),
            postprocess_status: episode.postprocess_status.as_str().to_string(),
            metadata_status: episode.metadata_status.as_str().to_string(),
            current_step: episode.current_step(),
            created_at: episode.created_at.to_rfc3339(),
            updated_at: episode.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct UpdateEpisodeRequest {
    pub title: Option<String>,
    pub editor_state: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list_episodes_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<EpisodeResponse>>, ApiError> {
    let episodes = state
        .episode_service
        .list_episodes(params.offset, params.limit)
        .await?;
    Ok(Json(episodes.into_iter().map(EpisodeResponse::from).collect()))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn create_episode_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EpisodeResponse>), ApiError> {
    let mut title: Option<String> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return Err(ApiError(ServiceError::Validation(format!(
                    "Failed to read multipart: {}",
                    e
                ))));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    ApiError(ServiceError::Validation(format!(
                        "Failed to read title: {}",
                        e
                    )))
                })?);
            }
            _ => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError(ServiceError::Validation(format!(
                        "Failed to read file: {}",
                        e
                    )))
                })?;
                tracing::debug!(filename = %filename, bytes = data.len(), "File field received");
                files.push(UploadedFile {
                    filename,
                    data: data.to_vec(),
                });
            }
        }
    }

    let episode = state.episode_service.create_episode(title, files).await?;
    Ok((StatusCode::CREATED, Json(episode.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_episode_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let episode = state.episode_service.get_episode(id).await?;
    Ok(Json(episode.into()))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_episode_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
    Json(request): Json<UpdateEpisodeRequest>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let episode = state
        .episode_service
        .update_episode(id, request.title, request.editor_state)
        .await?;
    Ok(Json(episode.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_episode_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    state.episode_service.delete_episode(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
