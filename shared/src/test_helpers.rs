//! Scriptable providers for pipeline tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::listing::{ListingEntry, VideoEntry};
use crate::models::VideoDescriptor;
use crate::providers::{AcquisitionProvider, AcquisitionRequest, ListingProvider};

fn fake_failure(message: &str) -> ProviderError {
    ProviderError::Exited {
        program: "fake".to_string(),
        status: "exit status: 1".to_string(),
        message: message.to_string(),
    }
}

/// Build a flat channel listing from `(id, title)` pairs.
pub fn channel_of(videos: &[(&str, &str)]) -> ListingEntry {
    ListingEntry::Container {
        title: Some("Sample".to_string()),
        entries: videos
            .iter()
            .map(|(id, title)| {
                ListingEntry::Video(VideoEntry {
                    id: Some(id.to_string()),
                    title: Some(title.to_string()),
                    url: Some(id.to_string()),
                    webpage_url: None,
                })
            })
            .collect(),
    }
}

pub fn descriptors(count: usize) -> Vec<VideoDescriptor> {
    (0..count)
        .map(|i| VideoDescriptor {
            id: format!("id{i}"),
            title: format!("Video {i}"),
            locator: format!("id{i}"),
        })
        .collect()
}

pub struct FakeListing {
    root: Option<ListingEntry>,
    error: Option<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeListing {
    pub fn with_root(root: ListingEntry) -> Self {
        Self { root: Some(root), error: None, requested: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { root: None, error: Some(message.to_string()), requested: Mutex::new(Vec::new()) }
    }

    pub fn nothing() -> Self {
        Self { root: None, error: None, requested: Mutex::new(Vec::new()) }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingProvider for FakeListing {
    async fn fetch_listing(&self, url: &str) -> Result<Option<ListingEntry>, ProviderError> {
        self.requested.lock().unwrap().push(url.to_string());
        match &self.error {
            Some(message) => Err(fake_failure(message)),
            None => Ok(self.root.clone()),
        }
    }
}

/// Succeeds unless the URL ends with a scripted failing or panicking id.
#[derive(Default)]
pub struct FakeAcquirer {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<AcquisitionRequest>>,
}

impl FakeAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn panic_on(mut self, id: &str) -> Self {
        self.panicking.insert(id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of simultaneous `acquire` calls observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AcquisitionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn matches(set: &HashSet<String>, url: &str) -> bool {
        set.iter().any(|id| url.ends_with(&format!("v={id}")) || url == id)
    }
}

#[async_trait]
impl AcquisitionProvider for FakeAcquirer {
    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), ProviderError> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if Self::matches(&self.panicking, &request.url) {
            panic!("scripted panic for {}", request.url);
        }
        if Self::matches(&self.failing, &request.url) {
            return Err(fake_failure("ERROR: Video unavailable"));
        }
        Ok(())
    }
}
