use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::EpisodeId;

/// The subtrees of one episode's storage root. Uploads land in `Source`;
/// each stage writes into its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaDir {
    Source,
    Preprocessed,
    Postprocessed,
    Metadata,
    Export,
}

impl MediaDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDir::Source => "source",
            MediaDir::Preprocessed => "preprocessed",
            MediaDir::Postprocessed => "postprocessed",
            MediaDir::Metadata => "metadata",
            MediaDir::Export => "export",
        }
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save_source(
        &self,
        episode_id: EpisodeId,
        filename: &str,
        data: &[u8],
    ) -> Result<(), MediaStoreError>;

    /// Creates the subtree if needed and returns its absolute path, for
    /// handing to the external processor.
    async fn ensure_dir(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
    ) -> Result<PathBuf, MediaStoreError>;

    fn dir_path(&self, episode_id: EpisodeId, dir: MediaDir) -> PathBuf;

    /// Filenames in the subtree, sorted; filtered to `extension` (no dot)
    /// when one is given.
    async fn list(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
        extension: Option<&str>,
    ) -> Result<Vec<String>, MediaStoreError>;

    async fn read(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
        filename: &str,
    ) -> Result<Vec<u8>, MediaStoreError>;

    /// Removes the episode's whole storage subtree.
    async fn delete_episode(&self, episode_id: EpisodeId) -> Result<(), MediaStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("unsafe file name: {0}")]
    UnsafeFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
