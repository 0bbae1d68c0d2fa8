/// Run configuration, built once at startup and passed down by reference.
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{RipError, RipResult};

pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_WORKERS: usize = 4;
pub const CHANNEL_URL_PREFIX: &str = "https://www.youtube.com/";
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct RipConfig {
    /// Parent directory; each channel gets its own folder below it.
    pub output_dir: PathBuf,
    /// Size of the acquisition worker pool. Always at least 1.
    pub workers: usize,
    /// Process only the first N listed videos. `None` means all.
    pub limit: Option<usize>,
    /// Directory that may hold a bundled ffmpeg.
    pub bundled_ffmpeg_dir: PathBuf,
    /// yt-dlp executable name or path.
    pub ytdlp_bin: String,
    /// Every accepted channel URL starts with this.
    pub channel_url_prefix: String,
    /// Prepended to bare video ids.
    pub watch_url_base: String,
    /// How long the bundled ffmpeg gets to answer `-version`.
    pub probe_timeout: Duration,
}

impl Default for RipConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            workers: DEFAULT_WORKERS,
            limit: None,
            bundled_ffmpeg_dir: default_bundled_ffmpeg_dir(),
            ytdlp_bin: "yt-dlp".to_string(),
            channel_url_prefix: CHANNEL_URL_PREFIX.to_string(),
            watch_url_base: WATCH_URL_BASE.to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }
}

impl RipConfig {
    /// Defaults overlaid with `CHANRIP_FFMPEG_DIR`, `YTDLP_BIN` and
    /// `CHANRIP_PROBE_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> RipResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("CHANRIP_FFMPEG_DIR") {
            config.bundled_ffmpeg_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = std::env::var("YTDLP_BIN") {
            config.ytdlp_bin = bin;
        }
        if let Ok(secs) = std::env::var("CHANRIP_PROBE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                RipError::Config(format!("CHANRIP_PROBE_TIMEOUT_SECS is not a number: {secs:?}"))
            })?;
            config.probe_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// A limit of 0 means no cap.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|n| *n > 0);
        self
    }
}

/// `ffmpeg/` next to the running executable, or `./ffmpeg` if that cannot be determined.
fn default_bundled_ffmpeg_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("ffmpeg")))
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}
