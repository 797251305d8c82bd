//! Embeddable playback surface around an mpv-style media engine.
//!
//! Architecture:
//! - `protocol.rs` - command/instruction encoding and engine event types
//! - `engine.rs` - backend traits the surface drives (`EngineBackend`, `Engine`, `RenderContext`)
//! - `render.rs` - host GPU types (`FrameTarget`, `OpenGlInitParams`)
//! - `repaint.rs` - coalesced cross-thread redraw signaling
//! - `surface.rs` - `PlaybackSurface` lifecycle, command submission, frame rendering
//! - `config.rs` - engine options applied before initialization
//! - `libmpv.rs` - in-process libmpv backend (`libmpv` cargo feature)
//!
//! The host GUI stays in charge of the window, the GL context and the event
//! loop. It hands the surface a proc-address resolver at `initialize`, calls
//! `render` from its paint callback with a fresh `FrameTarget`, and watches
//! the `RepaintSignal` to learn when the engine wants a new frame drawn. The
//! surface owns everything engine-side and tears it down in nesting order.

mod config;
mod engine;
mod error;
mod protocol;
mod render;
mod repaint;
mod surface;

#[cfg(feature = "libmpv")]
mod libmpv;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::SurfaceOptions;
pub use engine::{Engine, EngineBackend, EngineError, ErrorKind, RenderContext};
pub use error::{CommandError, InitError, RenderError};
pub use protocol::{Command, EngineEvent, Instruction, PropertyValue};
pub use render::{FrameTarget, OpenGlInitParams};
pub use repaint::RepaintSignal;
pub use surface::{PlaybackSurface, SurfaceState};

#[cfg(feature = "libmpv")]
pub use libmpv::LibmpvBackend;
