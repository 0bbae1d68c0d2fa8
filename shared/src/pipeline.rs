/// End-to-end channel rip: validate, name, resolve ffmpeg, list, dispatch, aggregate.
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::aggregator::ResultAggregator;
use crate::binary_resolver::BinaryResolver;
use crate::channel_link::validate_channel_url;
use crate::config::RipConfig;
use crate::dir_namer::derive_channel_dir_name;
use crate::dispatcher::AcquisitionDispatcher;
use crate::errors::RipResult;
use crate::listing::ChannelLister;
use crate::models::ChannelStats;
use crate::providers::{AcquisitionProvider, ListingProvider};
use crate::ytdlp::YtDlp;

pub struct ChannelRipper {
    config: Arc<RipConfig>,
    lister: ChannelLister,
    dispatcher: AcquisitionDispatcher,
    resolver: BinaryResolver,
}

impl ChannelRipper {
    pub fn new(
        config: Arc<RipConfig>,
        listing: Arc<dyn ListingProvider>,
        acquisition: Arc<dyn AcquisitionProvider>,
    ) -> Self {
        Self {
            lister: ChannelLister::new(listing),
            dispatcher: AcquisitionDispatcher::from_config(acquisition, &config),
            resolver: BinaryResolver::from_config(&config),
            config,
        }
    }

    /// Rip through the configured yt-dlp executable.
    pub fn with_ytdlp(config: Arc<RipConfig>) -> Self {
        let ytdlp = Arc::new(YtDlp::new(config.ytdlp_bin.clone()));
        Self::new(config, ytdlp.clone(), ytdlp)
    }

    /// `<output>/<derived channel name>`
    pub fn channel_dir(&self, channel_url: &str) -> PathBuf {
        self.config.output_dir.join(derive_channel_dir_name(channel_url))
    }

    /// Rip every video of a channel.
    ///
    /// Only an invalid URL, an uncreatable output directory or an outcome
    /// count mismatch are errors; per-video failures land in the stats.
    pub async fn run(&self, channel_url: &str) -> RipResult<ChannelStats> {
        validate_channel_url(channel_url, &self.config.channel_url_prefix)?;

        let output_path = self.channel_dir(channel_url);
        tokio::fs::create_dir_all(&output_path).await?;

        let ffmpeg = self.resolver.resolve().await;
        info!("Using ffmpeg from: {}", ffmpeg);
        info!("Channel folder: {}", derive_channel_dir_name(channel_url));
        let shown = tokio::fs::canonicalize(&output_path)
            .await
            .unwrap_or_else(|_| output_path.clone());
        info!("Output directory: {}", shown.display());

        let mut videos = self.lister.list(channel_url).await;
        if videos.is_empty() {
            error!("No videos found in the channel");
            return Ok(ChannelStats::empty());
        }

        if let Some(limit) = self.config.limit {
            videos.truncate(limit);
            info!("Limited to {} videos", limit);
        }

        let mut dispatch = self.dispatcher.spawn(videos, &output_path, &ffmpeg);
        ResultAggregator::new(dispatch.dispatched)
            .collect(&mut dispatch.outcomes)
            .await
    }
}
