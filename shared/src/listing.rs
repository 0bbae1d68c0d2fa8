/// Channel listing: the entry tree a listing provider returns and the
/// lister that flattens it into video descriptors.
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::channel_link::videos_tab_url;
use crate::models::VideoDescriptor;
use crate::providers::ListingProvider;

const UNKNOWN_TITLE: &str = "Unknown";
const UNKNOWN_ID: &str = "unknown";

/// A node in a channel listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Video(VideoEntry),
    /// A channel, playlist or tab holding further entries.
    Container {
        title: Option<String>,
        entries: Vec<ListingEntry>,
    },
}

/// Leaf fields as reported by the provider; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

impl VideoEntry {
    /// Explicit address if present, otherwise the bare id.
    fn locator(&self) -> Option<&str> {
        [&self.url, &self.webpage_url, &self.id]
            .into_iter()
            .filter_map(|l| l.as_deref())
            .find(|l| !l.is_empty())
    }

    fn to_descriptor(&self) -> Option<VideoDescriptor> {
        let locator = self.locator()?;
        Some(VideoDescriptor {
            id: self.id.clone().unwrap_or_else(|| UNKNOWN_ID.to_string()),
            title: self.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            locator: locator.to_string(),
        })
    }
}

/// Wire shape of one entry in yt-dlp's `--dump-single-json` output.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    /// Unresolvable entries show up as `null` under `--ignore-errors`.
    #[serde(default)]
    entries: Option<Vec<Option<RawEntry>>>,
}

impl From<RawEntry> for ListingEntry {
    fn from(raw: RawEntry) -> Self {
        match raw.entries {
            Some(entries) => ListingEntry::Container {
                title: raw.title,
                entries: entries.into_iter().flatten().map(ListingEntry::from).collect(),
            },
            None => ListingEntry::Video(VideoEntry {
                id: raw.id,
                title: raw.title,
                url: raw.url,
                webpage_url: raw.webpage_url,
            }),
        }
    }
}

impl ListingEntry {
    /// Parse a provider JSON document. A literal `null` yields `None`.
    pub fn from_json(json: &str) -> Result<Option<Self>, serde_json::Error> {
        let raw: Option<RawEntry> = serde_json::from_str(json)?;
        Ok(raw.map(ListingEntry::from))
    }
}

/// Flatten a listing root into descriptors, descending exactly one level.
///
/// Videos directly under the root come first in listing order; a nested
/// container (a channel tab) contributes its own videos in place. Anything
/// nested deeper is skipped.
pub fn flatten_listing(root: &ListingEntry) -> Vec<VideoDescriptor> {
    let entries = match root {
        ListingEntry::Container { entries, .. } => entries,
        ListingEntry::Video(_) => {
            warn!("Listing root is a single video, not a channel");
            return Vec::new();
        }
    };

    let mut videos = Vec::new();
    for entry in entries {
        match entry {
            ListingEntry::Video(video) => push_video(&mut videos, video),
            ListingEntry::Container { title, entries: nested } => {
                for nested_entry in nested {
                    match nested_entry {
                        ListingEntry::Video(video) => push_video(&mut videos, video),
                        ListingEntry::Container { title: deep, .. } => {
                            warn!(
                                "Skipping container {:?} nested inside {:?}",
                                deep.as_deref().unwrap_or(UNKNOWN_TITLE),
                                title.as_deref().unwrap_or(UNKNOWN_TITLE),
                            );
                        }
                    }
                }
            }
        }
    }
    videos
}

fn push_video(videos: &mut Vec<VideoDescriptor>, entry: &VideoEntry) {
    match entry.to_descriptor() {
        Some(descriptor) => videos.push(descriptor),
        None => debug!("Skipping listing entry without url or id: {:?}", entry.title),
    }
}

/// Turns a channel URL into the ordered list of its videos.
pub struct ChannelLister {
    provider: Arc<dyn ListingProvider>,
}

impl ChannelLister {
    pub fn new(provider: Arc<dyn ListingProvider>) -> Self {
        Self { provider }
    }

    /// List every video on the channel's videos tab.
    ///
    /// Never fails: provider errors are logged and yield an empty list.
    pub async fn list(&self, channel_url: &str) -> Vec<VideoDescriptor> {
        let url = videos_tab_url(channel_url);
        info!("Fetching video list from: {}", url);

        match self.provider.fetch_listing(&url).await {
            Ok(Some(root)) => {
                let videos = flatten_listing(&root);
                info!("Found {} videos", videos.len());
                videos
            }
            Ok(None) => {
                error!("Could not extract channel information");
                Vec::new()
            }
            Err(e) => {
                error!("Failed to fetch channel videos: {}", e);
                Vec::new()
            }
        }
    }
}
