/// Locate a working ffmpeg for the acquisition tool.
///
/// A bundled copy wins only if it actually runs on this host; a copy built
/// for another architecture or missing shared libraries falls back to
/// whatever the system PATH provides.
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::config::RipConfig;
use crate::models::ResolvedBinaryPath;

const FFMPEG_BINARY: &str = if cfg!(target_os = "windows") {
    "ffmpeg.exe"
} else {
    "ffmpeg"
};

pub struct BinaryResolver {
    bundled_dir: PathBuf,
    probe_timeout: Duration,
}

impl BinaryResolver {
    pub fn new(bundled_dir: impl Into<PathBuf>, probe_timeout: Duration) -> Self {
        Self {
            bundled_dir: bundled_dir.into(),
            probe_timeout,
        }
    }

    pub fn from_config(config: &RipConfig) -> Self {
        Self::new(config.bundled_ffmpeg_dir.clone(), config.probe_timeout)
    }

    pub fn bundled_binary(&self) -> PathBuf {
        self.bundled_dir.join(FFMPEG_BINARY)
    }

    /// Never fails; anything short of a clean `-version` run means `System`.
    pub async fn resolve(&self) -> ResolvedBinaryPath {
        let binary = self.bundled_binary();
        if !binary.is_file() {
            debug!("No bundled ffmpeg at {:?}", binary);
            return ResolvedBinaryPath::System;
        }

        if !self.probe(&binary).await {
            return ResolvedBinaryPath::System;
        }

        let dir = tokio::fs::canonicalize(&self.bundled_dir)
            .await
            .unwrap_or_else(|_| self.bundled_dir.clone());
        ResolvedBinaryPath::Bundled(dir)
    }

    async fn probe(&self, binary: &Path) -> bool {
        let status = tokio::time::timeout(
            self.probe_timeout,
            Command::new(binary)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status(),
        )
        .await;

        match status {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                debug!("Bundled ffmpeg {:?} exited with {}", binary, status);
                false
            }
            Ok(Err(e)) => {
                debug!("Bundled ffmpeg {:?} failed to run: {}", binary, e);
                false
            }
            Err(_) => {
                debug!(
                    "Bundled ffmpeg {:?} did not answer within {}s",
                    binary,
                    self.probe_timeout.as_secs_f32()
                );
                false
            }
        }
    }
}
