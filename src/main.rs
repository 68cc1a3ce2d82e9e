//! Tracelight - entry point.
//!
//! Loads configuration and blocklists, opens the capture source, and
//! runs the attribution pipeline until ctrl-c.

use std::borrow::Cow;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use tracelight::blocklist::source::SourceLoader;
use tracelight::config::Config;
use tracelight::dns::UpstreamResolver;
use tracelight::events::BroadcastSink;
use tracelight::network::{find_interface, PnetCapture};
use tracelight::pipeline::AttributionPipeline;

async fn run() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH")
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed("config.toml"));
    let config = Config::load(config_path.as_ref()).context("Failed to load configuration")?;

    tracelight::metrics::init(&config.metrics).context("Failed to initialize metrics")?;
    if config.metrics.enabled {
        info!("Metrics enabled on {}", config.metrics.listen);
    }

    info!("Starting tracelight...");
    info!("Upstream resolver: {}", config.upstream_resolver);

    // Build the block set before touching the interface; an empty set
    // is allowed and simply never matches.
    let loader = SourceLoader::new().context("Failed to create blocklist loader")?;
    let block_set = loader.load_all(&config).await;
    info!("Blocking {} domains", block_set.len());

    let interface =
        find_interface(config.interface.as_deref()).context("Failed to find network interface")?;
    info!("Capturing on interface: {}", interface.name);

    let capture = PnetCapture::open(&interface).context("Failed to open capture")?;

    let resolver = UpstreamResolver::new(
        config.upstream_resolver,
        Duration::from_secs(config.resolve_timeout_seconds),
    );
    let sink = BroadcastSink::new(config.event_capacity);

    let pipeline = AttributionPipeline::new(block_set, resolver, sink);
    let (frame_tx, frame_rx) = mpsc::channel::<Vec<u8>>(config.channel_capacity);

    let capture_handle = pipeline.spawn_capture(capture, frame_tx);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down...");
            pipeline.shutdown();
        }
        () = pipeline.run(frame_rx) => {
            info!("Capture source ended");
        }
    }

    let _ = capture_handle.await;
    info!("Shutdown complete.");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    run().await
}
