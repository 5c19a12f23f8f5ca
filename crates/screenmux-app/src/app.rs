use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use screenmux_core::{load_json, EngineConfig, LayoutProfile, Rect, Resolution, WindowHandle};
use screenmux_engine::{
    CompositedFrame, Engine, FrameSink, PatternSource, Request, SetLayoutRequest, StatsSink,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Host loop.
///
/// # Environment
/// - `SCREENMUX_CONFIG`: path to an `EngineConfig` JSON file (default config otherwise)
/// - `SCREENMUX_PROFILE`: path to a `LayoutProfile` JSON file (full-desktop layout otherwise)
/// - `SCREENMUX_FRAME_LIMIT`: frames to produce before exiting (default 300, 0 = until Ctrl-C)
///
/// # Flow
/// 1. Build the engine and dispatch the profile's layout on the control path
/// 2. Produce frames on a blocking render thread at the configured rate
/// 3. Forward frames to the sink until the limit or Ctrl-C
/// 4. Reset the layout and report totals
pub async fn run() -> Result<()> {
    let config = match std::env::var("SCREENMUX_CONFIG") {
        Ok(path) => load_json::<EngineConfig>(&path).with_context(|| format!("loading engine config {}", path))?,
        Err(_) => EngineConfig::default(),
    };
    let profile = match std::env::var("SCREENMUX_PROFILE") {
        Ok(path) => load_json::<LayoutProfile>(&path).with_context(|| format!("loading layout profile {}", path))?,
        Err(_) => LayoutProfile::desktop(config.output, Rect::from_size(1920, 1080)),
    };
    let frame_limit: u64 = std::env::var("SCREENMUX_FRAME_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(300);

    let engine = Arc::new(Engine::new(&config).context("creating engine")?);

    // ── Control path: apply the profile ────────────────────────────────────
    let request = SetLayoutRequest::from_profile(&profile).context("building layout request")?;
    info!(
        "Applying profile '{}' ({} element(s))",
        profile.name,
        request.element_count()
    );
    engine.dispatch(&Request::from(request));
    if let Some(code) = engine.status() {
        warn!("Layout accepted with status {:?}: frames will be blank", code);
    }

    let source = pattern_source_for(&profile);

    let mut sink = StatsSink::new(config.stats_interval);
    sink.initialize(engine.output_image())
        .await
        .context("initialising frame sink")?;

    // ── Render thread ──────────────────────────────────────────────────────
    let (frame_tx, mut frame_rx) = mpsc::channel::<CompositedFrame>(8);
    let stop = Arc::new(AtomicBool::new(false));
    let render_handle = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        tokio::task::spawn_blocking(move || render_loop(engine, source, frame_tx, stop, frame_limit))
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;

    loop {
        tokio::select! {
            maybe_frame = frame_rx.recv() => {
                let Some(frame) = maybe_frame else { break };
                if let Some(code) = frame.status {
                    tracing::debug!("Frame #{} status {:?}", frame.sequence, code);
                }
                if let Err(e) = sink.present(frame).await {
                    warn!("Sink rejected frame: {}", e);
                    stop.store(true, Ordering::Relaxed);
                }
            }
            _ = &mut ctrl_c, if !stopping => {
                info!("Ctrl-C received, stopping render thread");
                stopping = true;
                stop.store(true, Ordering::Relaxed);
            }
        }
    }

    let produced = render_handle.await.context("render thread panicked")?;

    engine.dispatch(&Request::reset_layout());
    sink.shutdown().await;

    info!(
        "Done: produced={} presented={} bytes={}",
        produced,
        sink.frames(),
        sink.bytes()
    );
    Ok(())
}

/// Blocking frame-production loop. Returns the number of frames produced.
fn render_loop(
    engine: Arc<Engine>,
    mut source: PatternSource,
    frame_tx: mpsc::Sender<CompositedFrame>,
    stop: Arc<AtomicBool>,
    frame_limit: u64,
) -> u64 {
    let interval = Duration::from_micros(engine.config().frame_interval_us());
    let mut next = Instant::now();
    let mut produced: u64 = 0;

    while !stop.load(Ordering::Relaxed) && (frame_limit == 0 || produced < frame_limit) {
        match engine.pull_frame(&mut source) {
            Ok(frame) => {
                if frame_tx.blocking_send(frame).is_err() {
                    warn!("Frame receiver gone, stopping render thread");
                    break;
                }
            }
            Err(code) => {
                warn!("Frame production failed: {}", code);
                break;
            }
        }
        produced += 1;

        next += interval;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    info!("Render thread exiting after {} frames", produced);
    produced
}

/// Synthetic source exposing every window the profile refers to.
fn pattern_source_for(profile: &LayoutProfile) -> PatternSource {
    let mut source = PatternSource::new(Resolution::FHD);
    for element in &profile.elements {
        if element.window == WindowHandle::DESKTOP {
            continue;
        }
        source = source.with_window(element.window, window_extent(element.clipping));
    }
    source
}

/// Smallest window size that contains `clip`, saturating at `u32::MAX`.
fn window_extent(clip: Rect) -> Resolution {
    let edge = |v: i64| u32::try_from(v.max(1)).unwrap_or(u32::MAX);
    Resolution::new(edge(clip.right()), edge(clip.bottom()))
}
