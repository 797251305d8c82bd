//! Public error taxonomy.
//!
//! Nothing here retries: every failure is returned to the host as a typed
//! result, and the host decides how to surface it (dialog, log line, exit
//! code).

use thiserror::Error;

use crate::engine::EngineError;

/// Fatal initialization failures. The surface instance is unusable
/// afterwards; construct a fresh one.
#[derive(Error, Debug)]
pub enum InitError {
  #[error("engine allocation failed: {0}")]
  EngineCreateFailed(#[source] EngineError),

  #[error("engine start-up rejected configuration: {0}")]
  EngineInitFailed(#[source] EngineError),

  #[error("render context creation failed: {0}")]
  RenderContextFailed(#[source] EngineError),

  #[error("surface lifecycle is already past initialization")]
  AlreadyInitialized,
}

/// Per-command failures. Recoverable: other commands are unaffected.
#[derive(Error, Debug)]
pub enum CommandError {
  #[error("media path is empty")]
  InvalidPath,

  #[error("surface is not ready for commands")]
  NotReady,

  #[error("engine rejected command: {0}")]
  Engine(#[source] EngineError),
}

/// Per-frame render failures.
#[derive(Error, Debug)]
pub enum RenderError {
  #[error("surface is not ready to render")]
  NotReady,

  /// The GPU context was invalidated (e.g. the host surface was destroyed).
  /// Recoverable: tear down and build a fresh surface.
  #[error("render context lost")]
  ContextLost,

  #[error("engine render failure: {0}")]
  Engine(#[source] EngineError),
}
