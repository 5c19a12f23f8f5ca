use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use screenmux_core::{
    fit_into, validate_layout, validate_layout_with, EngineConfig, ErrorCode, Image, ImageBuffer,
    LayoutParameter, Rect, ScreenMuxError, ValidationErrorType,
};
use tracing::{debug, info, trace, warn};

use crate::compositor::Canvas;
use crate::convert;
use crate::layout_state::{LayoutMode, LayoutState};
use crate::request::Request;
use crate::source::CaptureSource;

// MARK: - CompositedFrame

/// One output frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositedFrame {
    pub buffer: ImageBuffer,
    /// 1-based frame number.
    pub sequence: u64,
    /// Stream time derived from the configured frame rate.
    pub timestamp_us: u64,
    /// Non-fatal problem hit while producing this frame.
    pub status: Option<ErrorCode>,
}

// MARK: - Engine

#[derive(Debug, Default)]
struct EngineState {
    layout: LayoutState,
    status: Option<ErrorCode>,
}

/// Stateful compositor.
///
/// Layout changes arrive through [`Engine::dispatch`] on the control path.
/// [`Engine::pull_frame`] may run concurrently on a render thread; it works
/// from a snapshot taken under the same lock, so it never sees a layout
/// whose parameters and mode disagree.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    output: Image,
    state: Mutex<EngineState>,
    frames: AtomicU64,
    capture_errors: AtomicU64,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Self, ScreenMuxError> {
        config.validate()?;
        let mut output = Image::new();
        output.create(config.pixel_format, config.output.width, config.output.height)?;
        info!(
            "Engine ready: {} {} @ {}fps",
            config.output, config.pixel_format, config.fps
        );
        Ok(Self {
            config: config.clone(),
            output,
            state: Mutex::new(EngineState::default()),
            frames: AtomicU64::new(0),
            capture_errors: AtomicU64::new(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Format and size of produced frames.
    pub fn output_image(&self) -> &Image {
        &self.output
    }

    /// Apply a request. The whole request is applied under one lock.
    pub fn dispatch(&self, request: &Request) {
        let (mode, count, status) = {
            let mut state = self.lock();
            request.send_to(&mut state.layout);
            state.status = self.check_layout(&state.layout);
            (state.layout.mode(), state.layout.element_count(), state.status)
        };
        info!(
            "Request {} applied: mode={} elements={} status={:?}",
            request.name(),
            mode,
            count,
            status
        );
    }

    /// Snapshot of the current layout.
    pub fn layout(&self) -> LayoutState {
        self.lock().layout
    }

    /// Status of the current layout; `None` means no error.
    pub fn status(&self) -> Option<ErrorCode> {
        self.lock().status
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn output_rect(&self) -> Rect {
        self.config.output.as_rect()
    }

    /// Element parameters as composed: a native element covers the whole output.
    fn effective_parameters(&self, layout: &LayoutState) -> Vec<LayoutParameter> {
        let mut parameters = layout.parameters().to_vec();
        if layout.mode() == LayoutMode::Native {
            for parameter in &mut parameters {
                parameter.bound = self.output_rect();
            }
        }
        parameters
    }

    fn check_layout(&self, layout: &LayoutState) -> Option<ErrorCode> {
        if layout.mode() == LayoutMode::Empty {
            return None;
        }
        let (w, h) = (self.config.output.width, self.config.output.height);
        let errors = validate_layout(&self.effective_parameters(layout), w, h);
        if errors.is_ok() {
            return None;
        }
        for (index, error) in errors.iter() {
            warn!("Layout element[{}] invalid: {}", index, error);
        }
        Some(ErrorCode::InvalidLayout)
    }

    fn note_capture_error(&self, index: usize, error: &dyn std::fmt::Display) {
        let errs = self.capture_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if errs <= 10 || errs % 100 == 0 {
            warn!("Element[{}] capture error #{}: {}", index, errs, error);
        }
    }

    /// Compose the current layout into a new output frame.
    pub fn pull_frame(&self, source: &mut dyn CaptureSource) -> Result<CompositedFrame, ErrorCode> {
        let (layout, layout_status) = {
            let state = self.lock();
            (state.layout, state.status)
        };

        let mut canvas = Canvas::new(self.config.output.width, self.config.output.height);
        let mut status = layout_status;
        if layout_status != Some(ErrorCode::InvalidLayout) && layout.mode() != LayoutMode::Empty {
            if let Some(code) = self.compose(&layout, source, &mut canvas) {
                status = Some(code);
            }
        }

        let data = convert::rgb0_to(
            self.config.pixel_format,
            canvas.data(),
            canvas.width(),
            canvas.height(),
        );
        let buffer = ImageBuffer::new(self.output, Bytes::from(data))?;

        let sequence = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        let timestamp_us = (sequence - 1) * self.config.frame_interval_us();
        if sequence == 1 {
            info!("First frame produced ({} layout)", layout.mode());
        }
        if sequence % self.config.stats_interval.max(1) == 0 {
            info!(
                "Produced {} frames (mode={} capture_errors={})",
                sequence,
                layout.mode(),
                self.capture_errors.load(Ordering::Relaxed)
            );
        }
        trace!("Frame #{} mode={} status={:?}", sequence, layout.mode(), status);

        Ok(CompositedFrame { buffer, sequence, timestamp_us, status })
    }

    fn compose(&self, layout: &LayoutState, source: &mut dyn CaptureSource, canvas: &mut Canvas) -> Option<ErrorCode> {
        let parameters = self.effective_parameters(layout);
        // Windows can disappear between dispatch and capture.
        let windows = validate_layout_with(&parameters, canvas.width(), canvas.height(), |w| {
            source.is_window_valid(w)
        });
        let mut status = None;

        for (index, parameter) in parameters.iter().enumerate() {
            if let Some(error) = windows.get(index).filter(|e| e.kind == ValidationErrorType::TargetWindow) {
                self.note_capture_error(index, error);
                status = Some(ErrorCode::CaptureFailed);
                continue;
            }
            let bitmap = match source.capture(parameter) {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    self.note_capture_error(index, &e);
                    status = Some(ErrorCode::CaptureFailed);
                    continue;
                }
            };

            let (w, h) = if parameter.rotate.swaps_axes() {
                (bitmap.height(), bitmap.width())
            } else {
                (bitmap.width(), bitmap.height())
            };
            let dest = fit_into(w, h, parameter.bound, parameter.stretch, parameter.keep_aspect_ratio);
            debug!("Element[{}] window={} {} -> {}", index, parameter.window, parameter.clipping, dest);
            canvas.draw(&bitmap, dest, parameter.rotate, parameter.scale_filter);
        }

        status
    }
}
