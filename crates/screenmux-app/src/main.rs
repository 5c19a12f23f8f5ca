use anyhow::Result;
use screenmux_core::{ImagePixelFormat, MAX_PROCESSOR_SIZE};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod app;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=debug shows per-element placement, trace shows every frame
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .init();

    info!("ScreenMux v{}", env!("CARGO_PKG_VERSION"));
    let formats: Vec<_> = ImagePixelFormat::ALL.iter().map(|f| f.label()).collect();
    debug!(
        "Output formats: {} (up to {} layout elements)",
        formats.join(", "),
        MAX_PROCESSOR_SIZE
    );

    if let Err(e) = app::run().await {
        error!("ScreenMux stopped: {:#}", e);
        return Err(e);
    }
    info!("ScreenMux exited cleanly.");
    Ok(())
}
