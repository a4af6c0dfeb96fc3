use std::path::Path;

use async_trait::async_trait;

/// Contract of the external audio-processing tool. Alignment, noise
/// removal, transcription, chaptering, and export all happen behind this
/// boundary; the service only moves files and statuses around it.
#[async_trait]
pub trait AudioProcessor: Send + Sync {
    /// Aligns and cleans the uploaded tracks, writing per-speaker audio and
    /// subtitle files into `output_dir`. `reference` is the room-wide
    /// recording to align against, when one was uploaded.
    async fn preprocess(
        &self,
        reference: Option<&Path>,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError>;

    /// Merges the preprocessed tracks into the combined episode audio and
    /// subtitle files.
    async fn postprocess(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError>;

    /// Generates chapters and show notes from the postprocessed output.
    async fn generate_metadata(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError>;

    /// Renders the distribution-ready episode file.
    async fn export(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioProcessorError {
    #[error("failed to invoke processor: {0}")]
    InvocationFailed(String),
    #[error("processing failed: {0}")]
    ProcessFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
