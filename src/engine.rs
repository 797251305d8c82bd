//! The engine seam the surface drives.
//!
//! `PlaybackSurface` never talks to a concrete engine directly; it owns a
//! boxed `Engine` minted by an `EngineBackend`. The in-process libmpv backend
//! lives in `libmpv.rs` behind the `libmpv` cargo feature; tests drive the
//! surface with an in-memory fake.

use thiserror::Error;

use crate::config::SurfaceOptions;
use crate::protocol::{EngineEvent, Instruction, PropertyValue};
use crate::render::{FrameTarget, OpenGlInitParams};

/// Coarse classification of an engine failure, so the surface can map it
/// into its public error taxonomy without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Session allocation failed.
  Create,
  /// Start-up rejected the configuration.
  Init,
  /// An instruction was rejected.
  Command,
  /// A property read or observation failed.
  Property,
  /// A frame render failed.
  Render,
  /// The GPU context backing the render context was invalidated.
  ContextLost,
}

/// A failure reported by an engine backend.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct EngineError {
  pub kind: ErrorKind,
  pub message: String,
}

impl EngineError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }
}

/// Factory for engine sessions. One backend can mint any number of
/// independent engines.
pub trait EngineBackend {
  /// Allocate a raw, not yet initialized engine session.
  fn create(&self) -> Result<Box<dyn Engine>, EngineError>;
}

/// One playback-engine session, exclusively owned by a `PlaybackSurface`.
///
/// The surface guarantees the call sequence: `init` exactly once first, then
/// at most one `create_render_context`, then any number of `send` /
/// `get_property` / `observe_property` / `poll_event` calls, then `release`
/// exactly once (after the render context has been released).
pub trait Engine {
  /// Apply options and start the engine.
  fn init(&mut self, options: &SurfaceOptions) -> Result<(), EngineError>;

  /// Create the GPU render context for this session.
  fn create_render_context(
    &mut self,
    gl: OpenGlInitParams,
  ) -> Result<Box<dyn RenderContext>, EngineError>;

  /// Hand one encoded instruction to the engine. Fire-and-forget:
  /// acceptance, not completion.
  fn send(&mut self, instruction: &Instruction) -> Result<(), EngineError>;

  /// Read a property value.
  fn get_property(&mut self, name: &str) -> Result<PropertyValue, EngineError>;

  /// Subscribe to change notifications for a property, delivered through
  /// `poll_event` as `EngineEvent::PropertyChange`.
  fn observe_property(&mut self, name: &str) -> Result<(), EngineError>;

  /// Non-blocking drain of one pending engine event.
  fn poll_event(&mut self) -> Option<EngineEvent>;

  /// Release the session.
  fn release(&mut self);
}

/// GPU render context nested inside an engine session's lifetime.
pub trait RenderContext {
  /// Register the redraw notification callback. The engine may invoke it
  /// from any of its internal threads; the callback only flags a repaint and
  /// must never call back into the engine or the GPU.
  fn set_update_callback(&mut self, callback: Box<dyn Fn() + Send + Sync>);

  /// Render one frame into `target`. Synchronous: the frame is done when
  /// this returns.
  fn render(&mut self, target: FrameTarget) -> Result<(), EngineError>;

  /// Release the context. Runs before the owning engine is released.
  fn release(&mut self);
}
