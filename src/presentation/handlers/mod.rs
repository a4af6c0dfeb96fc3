mod artifacts;
mod episodes;
mod error;
mod health;
mod jobs;
mod stages;

pub use artifacts::{
    audio_file_handler, audios_handler, chapters_handler, postprocessed_audio_handler,
    show_notes_handler, srt_handler,
};
pub use episodes::{
    create_episode_handler, delete_episode_handler, get_episode_handler, list_episodes_handler,
    update_episode_handler,
};
pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
pub use jobs::list_jobs_handler;
pub use stages::{export_handler, metadata_handler, postprocess_handler, preprocess_handler};

use crate::application::services::ServiceError;
use crate::domain::EpisodeId;

pub(crate) fn parse_episode_id(raw: &str) -> Result<EpisodeId, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(EpisodeId::from_uuid)
        .map_err(|_| ApiError(ServiceError::Validation(format!("Invalid episode ID: {}", raw))))
}
