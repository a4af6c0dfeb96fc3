mod episode_service;
mod processing_worker;

pub use episode_service::{EpisodeService, ServiceError, UploadedFile, MAX_TOTAL_UPLOAD_BYTES};
pub use processing_worker::{ProcessingMessage, ProcessingWorker};
