/// Channel and video URL handling: prefix validation, videos-tab
/// normalisation and expansion of bare video ids.
use crate::errors::{RipError, RipResult};

/// Tab that lists a channel's uploads.
const VIDEOS_TAB: &str = "videos";

/// Reject anything that is not a channel on the canonical host.
pub fn validate_channel_url(url: &str, expected_prefix: &str) -> RipResult<()> {
    if url.starts_with(expected_prefix) {
        Ok(())
    } else {
        Err(RipError::InvalidChannelUrl {
            url: url.to_string(),
            expected_prefix: expected_prefix.to_string(),
        })
    }
}

/// Point a channel URL at its videos tab.
pub fn videos_tab_url(channel_url: &str) -> String {
    if channel_url.ends_with(&format!("/{VIDEOS_TAB}")) {
        channel_url.to_string()
    } else if channel_url.ends_with('/') {
        format!("{channel_url}{VIDEOS_TAB}")
    } else {
        format!("{channel_url}/{VIDEOS_TAB}")
    }
}

/// Expand a bare video id into a watch URL; full addresses pass through.
pub fn video_url(locator: &str, watch_url_base: &str) -> String {
    if locator.starts_with("http") {
        locator.to_string()
    } else {
        format!("{watch_url_base}{locator}")
    }
}
