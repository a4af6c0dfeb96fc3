use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{MediaDir, MediaStore, MediaStoreError};
use crate::domain::{is_safe_filename, EpisodeId};

/// Local filesystem media store. Every episode owns one subtree:
/// `<root>/episodes/<id>/{source,preprocessed,postprocessed,metadata,export}`.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf) -> Result<Self, MediaStoreError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn episode_root(&self, episode_id: EpisodeId) -> PathBuf {
        self.root.join("episodes").join(episode_id.to_string())
    }

    fn checked_path(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
        filename: &str,
    ) -> Result<PathBuf, MediaStoreError> {
        if !is_safe_filename(filename) {
            return Err(MediaStoreError::UnsafeFilename(filename.to_string()));
        }
        Ok(self.dir_path(episode_id, dir).join(filename))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save_source(
        &self,
        episode_id: EpisodeId,
        filename: &str,
        data: &[u8],
    ) -> Result<(), MediaStoreError> {
        let path = self.checked_path(episode_id, MediaDir::Source, filename)?;
        self.ensure_dir(episode_id, MediaDir::Source).await?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn ensure_dir(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
    ) -> Result<PathBuf, MediaStoreError> {
        let path = self.dir_path(episode_id, dir);
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }

    fn dir_path(&self, episode_id: EpisodeId, dir: MediaDir) -> PathBuf {
        self.episode_root(episode_id).join(dir.as_str())
    }

    async fn list(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
        extension: Option<&str>,
    ) -> Result<Vec<String>, MediaStoreError> {
        let path = self.dir_path(episode_id, dir);
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut filenames = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            let matches = match extension {
                Some(ext) => name
                    .rsplit_once('.')
                    .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext)),
                None => true,
            };
            if matches {
                filenames.push(name);
            }
        }
        filenames.sort();
        Ok(filenames)
    }

    async fn read(
        &self,
        episode_id: EpisodeId,
        dir: MediaDir,
        filename: &str,
    ) -> Result<Vec<u8>, MediaStoreError> {
        let path = self.checked_path(episode_id, dir, filename)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MediaStoreError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_episode(&self, episode_id: EpisodeId) -> Result<(), MediaStoreError> {
        let path = self.episode_root(episode_id);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
