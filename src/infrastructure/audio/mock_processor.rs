use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{AudioProcessor, AudioProcessorError};
use crate::domain::is_reference_filename;

/// Fabricates plausible stage outputs without touching real audio. Used by
/// the API tests to exercise the full status lifecycle.
pub struct MockAudioProcessor;

async fn list_wavs(dir: &Path) -> Result<Vec<String>, AudioProcessorError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(name) = entry.file_name().into_string() {
            if name.ends_with(".wav") {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl AudioProcessor for MockAudioProcessor {
    async fn preprocess(
        &self,
        _reference: Option<&Path>,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        // One aligned track and one subtitle file per speaker recording;
        // the reference track itself produces no output.
        for name in list_wavs(source_dir).await? {
            if is_reference_filename(&name) {
                continue;
            }
            let stem = name.strip_suffix(".wav").unwrap_or(&name);
            tokio::fs::write(output_dir.join(&name), b"aligned audio").await?;
            tokio::fs::write(output_dir.join(format!("{}.srt", stem)), b"1\n00:00:00,000 --> 00:00:01,000\n...\n").await?;
        }
        Ok(())
    }

    async fn postprocess(
        &self,
        _input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::fs::write(output_dir.join("episode.wav"), b"combined audio").await?;
        tokio::fs::write(
            output_dir.join("episode.srt"),
            b"1\n00:00:00,000 --> 00:00:01,000\n...\n",
        )
        .await?;
        Ok(())
    }

    async fn generate_metadata(
        &self,
        _input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::fs::write(output_dir.join("chapters.md"), b"# Chapters\n").await?;
        tokio::fs::write(output_dir.join("show_notes.md"), b"# Show Notes\n").await?;
        Ok(())
    }

    async fn export(
        &self,
        _input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::fs::write(output_dir.join("episode.mp3"), b"exported audio").await?;
        Ok(())
    }
}

/// Fails every stage with a fixed message.
pub struct FailingAudioProcessor {
    pub message: String,
}

impl FailingAudioProcessor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail(&self) -> Result<(), AudioProcessorError> {
        Err(AudioProcessorError::ProcessFailed(self.message.clone()))
    }
}

#[async_trait]
impl AudioProcessor for FailingAudioProcessor {
    async fn preprocess(
        &self,
        _reference: Option<&Path>,
        _source_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        self.fail()
    }

    async fn postprocess(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        self.fail()
    }

    async fn generate_metadata(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        self.fail()
    }

    async fn export(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        self.fail()
    }
}

/// Holds every stage for the given duration before succeeding. Lets tests
/// observe the busy states deterministically.
pub struct SlowAudioProcessor {
    pub delay: Duration,
}

impl SlowAudioProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AudioProcessor for SlowAudioProcessor {
    async fn preprocess(
        &self,
        _reference: Option<&Path>,
        _source_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn postprocess(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn generate_metadata(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn export(
        &self,
        _input_dir: &Path,
        _output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
