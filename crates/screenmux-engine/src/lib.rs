//! screenmux-engine: layout dispatch and frame compositing.
//!
//! # Layout modes
//!
//! | Mode | Elements | Placement |
//! |------|----------|-----------|
//! | `Empty` | 0 | blank frame |
//! | `Native` | 1 | fitted into the whole output |
//! | `Complex` | 0..=8 | each fitted into its own bound |
//!
//! # Usage
//!
//! ```rust,no_run
//! use screenmux_core::{EngineConfig, LayoutProfile, Rect, Resolution};
//! use screenmux_engine::{Engine, PatternSource, Request, SetLayoutRequest};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(&EngineConfig::default())?;
//! let profile = LayoutProfile::desktop(Resolution::VGA, Rect::from_size(1920, 1080));
//! engine.dispatch(&Request::from(SetLayoutRequest::from_profile(&profile)?));
//!
//! let mut source = PatternSource::new(Resolution::FHD);
//! let frame = engine.pull_frame(&mut source)?;
//! assert_eq!(frame.sequence, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! control thread                     render thread
//! ──────────────                     ─────────────
//! Request ──► Engine::dispatch       Engine::pull_frame
//!               │ (lock)               │ (lock, copy LayoutState)
//!               ▼                      ▼
//!          LayoutState ◄─────────── snapshot
//!                                      │
//!                         CaptureSource::capture per element
//!                                      │
//!                            Canvas (RGB0) ──► convert ──► CompositedFrame
//! ```

pub mod compositor;
pub mod convert;
pub mod engine;
pub mod layout_state;
pub mod request;
pub mod sink;
pub mod source;

pub use compositor::Canvas;
pub use engine::{CompositedFrame, Engine};
pub use layout_state::{LayoutMode, LayoutState};
pub use request::{Request, SetLayoutRequest};
pub use sink::{FrameSink, SinkError, StatsSink};
pub use source::{CaptureSource, PatternSource, SourceBitmap};
