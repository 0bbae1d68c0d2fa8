/// Seams to the external tools that list a channel and acquire its audio.
use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::listing::ListingEntry;
use crate::models::ResolvedBinaryPath;

/// Lists the entries behind a channel URL.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Fetch a flat, error-tolerant listing. `Ok(None)` means the tool
    /// produced no information at all.
    async fn fetch_listing(&self, url: &str) -> Result<Option<ListingEntry>, ProviderError>;
}

/// Fetches one video and turns it into a tagged audio file.
///
/// Retries happen inside the provider; a returned error is final.
#[async_trait]
pub trait AcquisitionProvider: Send + Sync {
    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), ProviderError>;
}

/// Post-processing steps, applied in order after the download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Transcode to `codec`; quality `"0"` is the best VBR setting.
    ExtractAudio { codec: String, quality: String },
    /// Write title/uploader/date tags into the file.
    EmbedMetadata,
    /// Attach the downloaded thumbnail as cover art.
    EmbedThumbnail,
}

/// Stream selection and retry knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioOptions {
    pub format: String,
    pub thumbnail_format: String,
    pub retries: u32,
    pub fragment_retries: u32,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            format: "bestaudio/best".to_string(),
            thumbnail_format: "jpg".to_string(),
            retries: 3,
            fragment_retries: 3,
        }
    }
}

/// Everything a provider needs to acquire one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionRequest {
    /// Fully-qualified video address.
    pub url: String,
    pub output_dir: PathBuf,
    /// File name template relative to `output_dir`; the title is the stem.
    pub output_template: String,
    pub ffmpeg: ResolvedBinaryPath,
    pub options: AudioOptions,
    pub postprocessors: Vec<PostProcessor>,
}

impl AcquisitionRequest {
    /// Best audio stream → MP3 at top VBR quality with tags and cover art.
    pub fn mp3(url: impl Into<String>, output_dir: impl Into<PathBuf>, ffmpeg: ResolvedBinaryPath) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            output_template: "%(title)s.%(ext)s".to_string(),
            ffmpeg,
            options: AudioOptions::default(),
            postprocessors: vec![
                PostProcessor::ExtractAudio {
                    codec: "mp3".to_string(),
                    quality: "0".to_string(),
                },
                PostProcessor::EmbedMetadata,
                PostProcessor::EmbedThumbnail,
            ],
        }
    }

    /// Full output path template handed to the tool.
    pub fn output_path_template(&self) -> PathBuf {
        self.output_dir.join(&self.output_template)
    }
}
