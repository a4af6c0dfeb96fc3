use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::domain::ProcessingJob;
use crate::presentation::state::AppState;

use super::{parse_episode_id, ApiError};

#[derive(Serialize)]
pub struct JobResponse {
    pub id: String,
    pub episode_id: String,
    pub job_type: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProcessingJob> for JobResponse {
    fn from(job: ProcessingJob) -> Self {
        Self {
            id: job.id.to_string(),
            episode_id: job.episode_id.to_string(),
            job_type: job.job_type.as_str().to_string(),
            status: job.status.as_str().to_string(),
            error_message: job.error_message,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

/// Job history for one episode, failure messages included, so a FAILED
/// stage badge can show what went wrong.
#[tracing::instrument(skip(state))]
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let id = parse_episode_id(&episode_id)?;
    let jobs = state.episode_service.list_jobs(id).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}
