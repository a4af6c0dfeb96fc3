use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::presentation::state::AppState;

use super::{parse_episode_id, ApiError};

/// Per-speaker audio files produced by preprocessing.
#[tracing::instrument(skip(state))]
pub async fn audios_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let filenames = state.episode_service.list_preprocessed_audios(id).await?;
    Ok(Json(filenames))
}

#[tracing::instrument(skip(state))]
pub async fn audio_file_handler(
    State(state): State<AppState>,
    Path((episode_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let data = state
        .episode_service
        .read_preprocessed_audio(id, &filename)
        .await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], data))
}

/// The combined subtitle file written by postprocessing.
#[tracing::instrument(skip(state))]
pub async fn srt_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let (_, data) = state.episode_service.read_combined_srt(id).await?;
    Ok(([(header::CONTENT_TYPE, "application/x-subrip")], data))
}

/// The combined episode audio written by postprocessing.
#[tracing::instrument(skip(state))]
pub async fn postprocessed_audio_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let (_, data) = state.episode_service.read_combined_audio(id).await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], data))
}

#[tracing::instrument(skip(state))]
pub async fn chapters_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let data = state.episode_service.read_chapters(id).await?;
    Ok(([(header::CONTENT_TYPE, "text/markdown")], data))
}

#[tracing::instrument(skip(state))]
pub async fn show_notes_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let data = state.episode_service.read_show_notes(id).await?;
    Ok(([(header::CONTENT_TYPE, "text/markdown")], data))
}
