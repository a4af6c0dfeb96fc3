use uuid::Uuid;

use super::EpisodeId;

/// Marker prefix of a reference recording: the room-wide track the
/// preprocessor aligns the per-speaker tracks against. Conference
/// recordings carry a `GMT<timestamp>` filename.
const REFERENCE_PREFIX: &str = "GMT";

/// One uploaded input audio file, owned by its episode. Never mutated.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: Uuid,
    pub episode_id: EpisodeId,
    pub filename: String,
    pub speaker: Option<String>,
    pub is_reference: bool,
}

impl SourceFile {
    pub fn new(episode_id: EpisodeId, filename: String) -> Self {
        let is_reference = is_reference_filename(&filename);
        let speaker = if is_reference {
            None
        } else {
            speaker_from_filename(&filename)
        };
        Self {
            id: Uuid::new_v4(),
            episode_id,
            filename,
            speaker,
            is_reference,
        }
    }
}

pub fn is_reference_filename(filename: &str) -> bool {
    filename.starts_with(REFERENCE_PREFIX)
}

/// Speaker tracks are named `<episode>-<speaker>.<ext>`; the segment after
/// the first dash names the speaker.
pub fn speaker_from_filename(filename: &str) -> Option<String> {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    stem.split_once('-')
        .map(|(_, speaker)| speaker.to_string())
        .filter(|speaker| !speaker.is_empty())
}

/// Rejects names that could escape the episode directory.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
}
