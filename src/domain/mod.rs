mod artifact;
mod episode;
mod episode_id;
mod job;
mod job_id;
mod job_status;
mod job_type;
mod source_file;

pub use artifact::{pick_combined, MetadataFile, ProcessedFile, Transcription};
pub use episode::Episode;
pub use episode_id::EpisodeId;
pub use job::ProcessingJob;
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use job_type::JobType;
pub use source_file::{is_reference_filename, is_safe_filename, speaker_from_filename, SourceFile};
