use async_trait::async_trait;
use screenmux_core::Image;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::CompositedFrame;

// MARK: - FrameSink trait

/// Consumer of composited frames on the host side of the graph.
///
/// Implementations:
/// - `StatsSink`: counts and logs throughput
#[async_trait]
pub trait FrameSink: Send {
    /// Prepare for frames described by `image`.
    async fn initialize(&mut self, image: &Image) -> Result<(), SinkError>;

    /// Deliver one frame.
    async fn present(&mut self, frame: CompositedFrame) -> Result<(), SinkError>;

    /// Release resources.
    async fn shutdown(&mut self);
}

// MARK: - SinkError

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink used before initialize()")]
    NotInitialized,

    #[error("Frame format {got:?} does not match the negotiated {expected:?}")]
    FormatMismatch { expected: Image, got: Image },

    #[error("Sink already shut down")]
    Closed,
}

// MARK: - StatsSink

/// Sink that records throughput and logs it periodically.
#[derive(Debug)]
pub struct StatsSink {
    image: Option<Image>,
    log_interval: u64,
    frames: u64,
    bytes: u64,
    last_sequence: u64,
    closed: bool,
}

impl StatsSink {
    pub fn new(log_interval: u64) -> Self {
        Self {
            image: None,
            log_interval: log_interval.max(1),
            frames: 0,
            bytes: 0,
            last_sequence: 0,
            closed: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Sequence number of the last presented frame.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }
}

#[async_trait]
impl FrameSink for StatsSink {
    async fn initialize(&mut self, image: &Image) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        debug!("StatsSink negotiated {:?}", image);
        self.image = Some(*image);
        Ok(())
    }

    async fn present(&mut self, frame: CompositedFrame) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let expected = self.image.ok_or(SinkError::NotInitialized)?;
        let got = *frame.buffer.image();
        if got != expected {
            return Err(SinkError::FormatMismatch { expected, got });
        }

        self.frames += 1;
        self.bytes += frame.buffer.data().len() as u64;
        self.last_sequence = frame.sequence;
        if self.frames % self.log_interval == 0 {
            info!(
                "StatsSink: {} frames, {:.1} MiB, last seq={} ts={}us",
                self.frames,
                self.bytes as f64 / (1024.0 * 1024.0),
                frame.sequence,
                frame.timestamp_us
            );
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        if !self.closed {
            info!("StatsSink closed after {} frames", self.frames);
        }
        self.closed = true;
    }
}
