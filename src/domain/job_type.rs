use std::fmt;
use std::str::FromStr;

/// The kinds of work a processing job can carry out. The first four form an
/// ordered pipeline; `AudioEdit` re-renders the postprocessed output after
/// the editor state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    Preprocess,
    Postprocess,
    Metadata,
    Export,
    AudioEdit,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Preprocess => "preprocess",
            JobType::Postprocess => "postprocess",
            JobType::Metadata => "metadata",
            JobType::Export => "export",
            JobType::AudioEdit => "audio_edit",
        }
    }

    /// The stage that must be COMPLETED before this one may start.
    pub fn prerequisite(&self) -> Option<JobType> {
        match self {
            JobType::Preprocess => None,
            JobType::Postprocess => Some(JobType::Preprocess),
            JobType::Metadata => Some(JobType::Postprocess),
            JobType::Export => Some(JobType::Metadata),
            JobType::AudioEdit => Some(JobType::Preprocess),
        }
    }

    /// Whether the episode record carries a status column for this stage.
    /// Export and audio edits are tracked through their job row only.
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            JobType::Preprocess | JobType::Postprocess | JobType::Metadata
        )
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preprocess" => Ok(JobType::Preprocess),
            "postprocess" => Ok(JobType::Postprocess),
            "metadata" => Ok(JobType::Metadata),
            "export" => Ok(JobType::Export),
            "audio_edit" => Ok(JobType::AudioEdit),
            _ => Err(format!("Invalid job type: {}", s)),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
