/// Command-line surface.
use std::path::PathBuf;

use clap::Parser;

use chanrip_shared::config::{DEFAULT_OUTPUT_DIR, DEFAULT_WORKERS};

#[derive(Debug, Parser)]
#[command(
    name = "chanrip",
    version,
    about = "Download all videos from a YouTube channel as MP3 files.",
    after_help = "Examples:\n  \
        chanrip https://www.youtube.com/@channelname\n  \
        chanrip https://www.youtube.com/@channelname -o ./my_music\n  \
        chanrip https://www.youtube.com/@channelname -w 8 --limit 10"
)]
pub struct Cli {
    /// YouTube channel URL (e.g. https://www.youtube.com/@channelname)
    pub channel_url: String,

    /// Output directory for MP3 files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Number of concurrent downloads
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Limit the number of videos to download (default: all)
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

impl Cli {
    /// Requested cap; zero or negative means every video.
    pub fn video_limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0).and_then(|n| usize::try_from(n).ok())
    }
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
