//! Chanrip core: turn every video of a channel into a tagged MP3 using a
//! bounded pool of concurrent workers.

pub mod aggregator;
pub mod binary_resolver;
pub mod channel_link;
pub mod config;
pub mod dir_namer;
pub mod dispatcher;
pub mod errors;
pub mod listing;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod ytdlp;

#[cfg(test)]
mod test_helpers;

pub use config::RipConfig;
pub use errors::{ProviderError, RipError, RipResult};
pub use models::{AcquisitionOutcome, ChannelStats, FailedVideo, ResolvedBinaryPath, VideoDescriptor};
pub use pipeline::ChannelRipper;
