/// Chanrip - Main Entry Point
///
/// Rips every video of a YouTube channel to MP3 with a bounded pool of
/// concurrent yt-dlp workers.
mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use chanrip_shared::channel_link::validate_channel_url;
use chanrip_shared::{ChannelRipper, ChannelStats, RipConfig};
use cli::Cli;

const RULE_WIDTH: usize = 60;

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chanrip_downloader=info,chanrip_shared=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let config = match RipConfig::from_env().context("Failed to read configuration") {
        Ok(config) => config
            .with_output_dir(&cli.output)
            .with_workers(cli.workers)
            .with_limit(cli.video_limit()),
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    if let Err(hint) = check_channel_url(&cli.channel_url, &config) {
        eprintln!("{hint}");
        return 1;
    }

    print_banner(&cli.channel_url, &config);

    let ripper = ChannelRipper::with_ytdlp(Arc::new(config));
    let result = ripper
        .run(&cli.channel_url)
        .await
        .with_context(|| format!("Failed to rip {}", cli.channel_url));

    if let Ok(stats) = &result {
        print_summary(stats);
    }
    exit_code(&result)
}

/// Usage hint for a URL outside the accepted prefix.
fn check_channel_url(channel_url: &str, config: &RipConfig) -> Result<(), String> {
    validate_channel_url(channel_url, &config.channel_url_prefix).map_err(|_| {
        format!(
            "[ERROR] Invalid YouTube URL. Please provide a valid YouTube channel URL.\n\
             Example: {}@channelname",
            config.channel_url_prefix
        )
    })
}

/// 0 only when the rip finished and every video succeeded.
fn exit_code(result: &anyhow::Result<ChannelStats>) -> i32 {
    match result {
        Ok(stats) => stats.exit_code(),
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn print_banner(channel_url: &str, config: &RipConfig) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}");
    println!("  YouTube Channel Audio Ripper");
    println!("{rule}");
    println!("  Channel: {channel_url}");
    println!("  Output:  {}", config.output_dir.display());
    println!("  Workers: {}", config.workers);
    if let Some(limit) = config.limit {
        println!("  Limit:   {limit} videos");
    }
    println!("{rule}\n");
}

fn print_summary(stats: &ChannelStats) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("\n[COMPLETE] Downloaded: {}/{} videos", stats.succeeded, stats.total);
    if stats.failed > 0 {
        println!("[FAILED] {} videos failed to download", stats.failed);
        for failure in &stats.errors {
            println!("  - {}: {}", failure.title, failure.error);
        }
    }
}
