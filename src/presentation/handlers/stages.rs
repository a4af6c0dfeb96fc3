use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::domain::JobType;
use crate::presentation::state::AppState;

use super::jobs::JobResponse;
use super::{parse_episode_id, ApiError};

async fn initiate(
    state: AppState,
    episode_id: String,
    job_type: JobType,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let job = state.episode_service.initiate_stage(id, job_type).await?;
    Ok((StatusCode::ACCEPTED, Json(job.into())))
}

/// Re-runs preprocessing after a failure.
#[tracing::instrument(skip(state))]
pub async fn preprocess_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    initiate(state, episode_id, JobType::Preprocess).await
}

#[tracing::instrument(skip(state))]
pub async fn postprocess_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    initiate(state, episode_id, JobType::Postprocess).await
}

#[tracing::instrument(skip(state))]
pub async fn metadata_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    initiate(state, episode_id, JobType::Metadata).await
}

#[tracing::instrument(skip(state))]
pub async fn export_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    initiate(state, episode_id, JobType::Export).await
}
