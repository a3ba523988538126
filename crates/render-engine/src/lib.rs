//! Reelsmith Render Engine
//!
//! Batch assembly of short clips into one deliverable. Every heavy step is
//! delegated to an external transcoder; this crate builds the invocations,
//! runs them with timeouts and sequences them.
//!
//! # Pipeline Architecture
//!
//! ```text
//! video/source*.mp4 ──┐
//!                     ├── Discover + order (ClipCatalog)
//!                     │         │
//! overlay.png ────────┤         ├── Scale + Overlay + Text burn (per clip)
//! text fields ────────┘         │
//!                               ├── Concat (stream copy) ── medium.mp4
//!                               │
//! audio/voice.mp3 ──────────────├── Probe + Loop (stream copy) ── silent.mp4
//!                               │
//!                               ▼
//!                         Mux (aac, -shortest)
//!                               │
//!                               ▼
//!                       youtube_ready.mp4
//! ```

pub mod audio_match;
pub mod compositor;
pub mod concat;
pub mod engine;
pub mod mux;
pub mod overlay_image;
pub mod pipeline;
pub mod progress;
pub mod renderer;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{EngineCommand, EngineContext, FfmpegEngine, MediaEngine};
pub use pipeline::*;
pub use progress::*;
