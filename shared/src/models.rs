/// Data types shared across all Chanrip crates.
use std::path::{Path, PathBuf};

/// One video as reported by the channel listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor {
    pub id: String,
    pub title: String,
    /// Either a bare video id or a fully-qualified address.
    pub locator: String,
}

/// Result of acquiring a single video. Exactly one exists per dispatched descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionOutcome {
    pub video_id: String,
    pub title: String,
    /// The normalized, fully-qualified address that was handed to the provider.
    pub locator: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl AcquisitionOutcome {
    pub fn success(video: &VideoDescriptor, locator: String) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            locator,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(video: &VideoDescriptor, locator: String, error: impl Into<String>) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            locator,
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

/// A failed video in the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedVideo {
    pub title: String,
    pub error: String,
}

/// Channel-level statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures in the order their outcomes arrived.
    pub errors: Vec<FailedVideo>,
}

impl ChannelStats {
    /// Stats for a run that dispatched nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no dispatched video failed. An empty run counts as success.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

/// Where the media-processing binary should come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBinaryPath {
    /// A bundled copy that answered its version probe; holds its absolute directory.
    Bundled(PathBuf),
    /// Let the acquisition tool search the system PATH itself.
    System,
}

impl ResolvedBinaryPath {
    /// Directory to hand to the acquisition tool, if any.
    pub fn location(&self) -> Option<&Path> {
        match self {
            ResolvedBinaryPath::Bundled(dir) => Some(dir),
            ResolvedBinaryPath::System => None,
        }
    }
}

impl std::fmt::Display for ResolvedBinaryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedBinaryPath::Bundled(dir) => write!(f, "{}", dir.display()),
            ResolvedBinaryPath::System => write!(f, "system PATH"),
        }
    }
}
