use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{EpisodeId, JobType};

/// Audio file produced by a processing stage. Immutable once written,
/// removed with the episode.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub id: Uuid,
    pub episode_id: EpisodeId,
    pub stage: JobType,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessedFile {
    pub fn new(episode_id: EpisodeId, stage: JobType, filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            episode_id,
            stage,
            filename,
            created_at: Utc::now(),
        }
    }
}

/// Subtitle file produced alongside processed audio.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub id: Uuid,
    pub episode_id: EpisodeId,
    pub stage: JobType,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl Transcription {
    pub fn new(episode_id: EpisodeId, stage: JobType, filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            episode_id,
            stage,
            filename,
            created_at: Utc::now(),
        }
    }
}

/// Generated show metadata (chapters, show notes).
#[derive(Debug, Clone)]
pub struct MetadataFile {
    pub id: Uuid,
    pub episode_id: EpisodeId,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl MetadataFile {
    pub fn new(episode_id: EpisodeId, filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            episode_id,
            filename,
            created_at: Utc::now(),
        }
    }
}

/// Picks the combined (all-speakers) file out of a stage's outputs.
/// Per-speaker outputs carry a dash in their stem; the combined render does
/// not. Falls back to the first file when every stem is dashed.
pub fn pick_combined<'a>(filenames: &'a [String]) -> Option<&'a str> {
    filenames
        .iter()
        .find(|name| {
            let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
            !stem.contains('-')
        })
        .or_else(|| filenames.first())
        .map(String::as_str)
}
