use std::fmt;

/// Degraded-but-successful outcomes surfaced to the operator after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// No usable remote phonebook; every quick dial starts out unset.
    SnapshotUnavailable { reason: String },
    /// An image could not be stored; its entry was written without a picture.
    ImageUploadFailed { file_name: String, reason: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::SnapshotUnavailable { reason } => {
                write!(f, "existing phonebook unavailable, quick dials not preserved ({})", reason)
            }
            PipelineWarning::ImageUploadFailed { file_name, reason } => {
                write!(f, "could not upload {}: {}", file_name, reason)
            }
        }
    }
}

/// Counts reported back from the image upload step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageUploadStats {
    pub uploaded: usize,
    pub total: usize,
}
