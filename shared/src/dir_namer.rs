/// Channel URL → filesystem-safe folder name.
///
/// Understands `@handle`, `/channel/UC…`, `/c/custom` and `/user/name` forms
/// and ignores a trailing `/videos` tab.
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Path segments after which the channel name follows.
const NAMESPACE_SEGMENTS: &[&str] = &["channel", "c", "user"];

/// Returned when nothing usable survives sanitising.
const FALLBACK_NAME: &str = "channel";

/// Any run of characters that is unsafe in a single path component.
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid")
});

/// Derive the folder name for a channel. Never empty.
pub fn derive_channel_dir_name(channel_url: &str) -> String {
    let (path, host) = split_path_and_host(channel_url);

    let mut path = path.trim_end_matches('/');
    if let Some(stripped) = path.strip_suffix("/videos") {
        path = stripped;
    }

    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect();

    let candidate = match segments.as_slice() {
        [] => host,
        [first, second, ..] if NAMESPACE_SEGMENTS.contains(&first.as_str()) => second.clone(),
        [.., last] => last.clone(),
    };

    let candidate = candidate.strip_prefix('@').unwrap_or(&candidate);
    let sanitized = DISALLOWED_RE.replace_all(candidate, "_");

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized.into_owned()
    }
}

/// Returns the raw path and the host. Unparseable input is treated as a bare path.
fn split_path_and_host(channel_url: &str) -> (String, String) {
    match Url::parse(channel_url) {
        Ok(url) => (
            url.path().to_string(),
            url.host_str().unwrap_or_default().to_string(),
        ),
        Err(_) => {
            let end = channel_url.find(['?', '#']).unwrap_or(channel_url.len());
            (channel_url[..end].to_string(), String::new())
        }
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
