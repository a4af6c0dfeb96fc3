use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{AudioProcessor, AudioProcessorError};

/// Drives the external audio-processing tool as a subprocess. One
/// subcommand per stage; a non-zero exit turns the tail of stderr into the
/// stored failure message.
pub struct CliAudioProcessor {
    command: String,
}

impl CliAudioProcessor {
    pub fn new(command: String) -> Self {
        Self { command }
    }

    async fn run(&self, args: &[&str]) -> Result<(), AudioProcessorError> {
        tracing::debug!(command = %self.command, ?args, "Invoking audio processor");

        let output = Command::new(&self.command)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AudioProcessorError::InvocationFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no output")
                .to_string();
            return Err(AudioProcessorError::ProcessFailed(detail));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioProcessor for CliAudioProcessor {
    async fn preprocess(
        &self,
        reference: Option<&Path>,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        let source = source_dir.to_string_lossy().into_owned();
        let output = output_dir.to_string_lossy().into_owned();
        let mut args = vec![
            "preprocess",
            "--source-dir",
            source.as_str(),
            "--output-dir",
            output.as_str(),
        ];
        let reference = reference.map(|p| p.to_string_lossy().into_owned());
        if let Some(reference) = reference.as_deref() {
            args.push("--reference");
            args.push(reference);
        }
        self.run(&args).await
    }

    async fn postprocess(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        let input = input_dir.to_string_lossy().into_owned();
        let output = output_dir.to_string_lossy().into_owned();
        self.run(&[
            "postprocess",
            "--input-dir",
            input.as_str(),
            "--output-dir",
            output.as_str(),
        ])
        .await
    }

    async fn generate_metadata(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        let input = input_dir.to_string_lossy().into_owned();
        let output = output_dir.to_string_lossy().into_owned();
        self.run(&[
            "metadata",
            "--input-dir",
            input.as_str(),
            "--output-dir",
            output.as_str(),
        ])
        .await
    }

    async fn export(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), AudioProcessorError> {
        let input = input_dir.to_string_lossy().into_owned();
        let output = output_dir.to_string_lossy().into_owned();
        self.run(&[
            "export",
            "--input-dir",
            input.as_str(),
            "--output-dir",
            output.as_str(),
        ])
        .await
    }
}
