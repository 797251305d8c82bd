//! The playback surface: lifecycle, command forwarding, frame rendering.

use crate::config::SurfaceOptions;
use crate::engine::{Engine, EngineBackend, EngineError, ErrorKind, RenderContext};
use crate::error::{CommandError, InitError, RenderError};
use crate::protocol::{Command, EngineEvent, PropertyValue};
use crate::render::{FrameTarget, OpenGlInitParams};
use crate::repaint::RepaintSignal;

/// Lifecycle of a surface instance.
///
/// Strictly forward: `Uninitialized → Initializing → Ready → Closing →
/// Closed`, with `Failed` terminal from `Initializing`. A surface never
/// re-enters `Initializing`; after `Failed` (or a lost render context) the
/// host constructs a fresh surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
  Uninitialized,
  Initializing,
  Ready,
  Closing,
  Closed,
  Failed,
}

/// Owns one playback-engine session and the GPU render context nested inside
/// it, and bridges the engine's asynchronous redraw callback into a coalesced
/// repaint flag for the host.
///
/// Threading: `initialize`, `submit`, `render` and `teardown` all belong to
/// the host's GUI/render thread. The only cross-thread traffic is the
/// engine's update callback, which lands in the `RepaintSignal`.
pub struct PlaybackSurface {
  state: SurfaceState,
  options: SurfaceOptions,
  backend: Box<dyn EngineBackend>,
  // declared before the engine: the render context's lifetime is strictly
  // nested inside the engine's, so it must drop first
  render: Option<Box<dyn RenderContext>>,
  engine: Option<Box<dyn Engine>>,
  repaint: RepaintSignal,
}

impl PlaybackSurface {
  pub fn new(backend: Box<dyn EngineBackend>, options: SurfaceOptions) -> Self {
    Self {
      state: SurfaceState::Uninitialized,
      options,
      backend,
      render: None,
      engine: None,
      repaint: RepaintSignal::new(),
    }
  }

  pub fn state(&self) -> SurfaceState {
    self.state
  }

  /// The coalesced repaint flag the engine's update callback feeds.
  pub fn repaint(&self) -> &RepaintSignal {
    &self.repaint
  }

  /// Create the engine session, apply options, and bring up the render
  /// context against the host's GL proc-address resolver.
  ///
  /// On any failure the partial resources already created are released
  /// before this returns, and the surface lands in `Failed`.
  pub fn initialize(&mut self, gl: OpenGlInitParams) -> Result<(), InitError> {
    if self.state != SurfaceState::Uninitialized {
      log::warn!("initialize called in state {:?}", self.state);
      return Err(InitError::AlreadyInitialized);
    }
    self.state = SurfaceState::Initializing;

    if let Err(message) = self.options.validate() {
      log::error!("invalid surface options: {}", message);
      self.state = SurfaceState::Failed;
      return Err(InitError::EngineInitFailed(EngineError::new(
        ErrorKind::Init,
        message,
      )));
    }

    log::info!("initializing playback surface");

    let mut engine = match self.backend.create() {
      Ok(engine) => engine,
      Err(e) => {
        log::error!("engine allocation failed: {}", e);
        self.state = SurfaceState::Failed;
        return Err(InitError::EngineCreateFailed(e));
      }
    };

    if let Err(e) = engine.init(&self.options) {
      log::error!("engine start-up rejected configuration: {}", e);
      engine.release();
      self.state = SurfaceState::Failed;
      return Err(InitError::EngineInitFailed(e));
    }

    let mut render = match engine.create_render_context(gl) {
      Ok(render) => render,
      Err(e) => {
        log::error!("render context creation failed: {}", e);
        engine.release();
        self.state = SurfaceState::Failed;
        return Err(InitError::RenderContextFailed(e));
      }
    };

    // The callback may fire from any engine thread; it only marks the flag.
    let signal = self.repaint.clone();
    render.set_update_callback(Box::new(move || signal.notify()));

    self.engine = Some(engine);
    self.render = Some(render);
    self.state = SurfaceState::Ready;
    log::info!("playback surface ready");
    Ok(())
  }

  /// Validate and forward one command to the engine.
  ///
  /// Fire-and-forget: `Ok` means the engine accepted the instruction, not
  /// that it completed. Watch `poll_events` for completion.
  pub fn submit(&mut self, command: Command) -> Result<(), CommandError> {
    if let Command::Load(path) = &command {
      if path.is_empty() {
        return Err(CommandError::InvalidPath);
      }
    }
    if self.state != SurfaceState::Ready {
      return Err(CommandError::NotReady);
    }
    let engine = self.engine.as_mut().ok_or(CommandError::NotReady)?;

    let instruction = command.encode();
    log::debug!(
      "submitting {} (request {})",
      instruction.name(),
      instruction.request_id
    );
    engine.send(&instruction).map_err(|e| {
      log::warn!("engine rejected {}: {}", instruction.name(), e);
      CommandError::Engine(e)
    })
  }

  /// Render one frame into `target`.
  ///
  /// Host render/paint callback only, never reentrant. `ContextLost` is
  /// recoverable by tearing down and building a fresh surface; any other
  /// engine-side failure is logged and returned.
  pub fn render(&mut self, target: FrameTarget) -> Result<(), RenderError> {
    if self.state != SurfaceState::Ready {
      return Err(RenderError::NotReady);
    }
    let render = self.render.as_mut().ok_or(RenderError::NotReady)?;

    match render.render(target) {
      Ok(()) => Ok(()),
      Err(e) if e.kind == ErrorKind::ContextLost => {
        log::warn!("render context lost: {}", e);
        Err(RenderError::ContextLost)
      }
      Err(e) => {
        log::error!("engine render failure: {}", e);
        Err(RenderError::Engine(e))
      }
    }
  }

  /// Subscribe to engine property change notifications, delivered through
  /// `poll_events` as `PropertyChange`.
  pub fn observe(&mut self, property: &str) -> Result<(), CommandError> {
    if self.state != SurfaceState::Ready {
      return Err(CommandError::NotReady);
    }
    let engine = self.engine.as_mut().ok_or(CommandError::NotReady)?;
    engine.observe_property(property).map_err(CommandError::Engine)
  }

  /// Drain pending engine events without blocking. Empty outside `Ready`.
  pub fn poll_events(&mut self) -> Vec<EngineEvent> {
    if self.state != SurfaceState::Ready {
      return Vec::new();
    }
    let mut events = Vec::new();
    if let Some(engine) = self.engine.as_mut() {
      while let Some(event) = engine.poll_event() {
        events.push(event);
      }
    }
    events
  }

  /// Current playback position in seconds, if the engine has one.
  pub fn position(&mut self) -> Option<f64> {
    self.property("time-pos")?.as_f64()
  }

  /// Duration of the current file in seconds, if known yet.
  pub fn duration(&mut self) -> Option<f64> {
    self.property("duration")?.as_f64()
  }

  /// Current pause state, if the engine has one.
  pub fn paused(&mut self) -> Option<bool> {
    self.property("pause")?.as_bool()
  }

  fn property(&mut self, name: &str) -> Option<PropertyValue> {
    if self.state != SurfaceState::Ready {
      return None;
    }
    let engine = self.engine.as_mut()?;
    match engine.get_property(name) {
      Ok(PropertyValue::Null) => None,
      Ok(value) => Some(value),
      Err(e) => {
        log::debug!("property {} unavailable: {}", name, e);
        None
      }
    }
  }

  /// Release the render context, then the engine, and mark the surface
  /// terminal. Idempotent, and safe after a failed `initialize` (whatever
  /// partial resources existed were already released on that path).
  pub fn teardown(&mut self) {
    match self.state {
      SurfaceState::Closing | SurfaceState::Closed => return,
      _ => {}
    }
    self.state = SurfaceState::Closing;

    if let Some(mut render) = self.render.take() {
      render.release();
    }
    if let Some(mut engine) = self.engine.take() {
      engine.release();
    }

    self.state = SurfaceState::Closed;
    log::info!("playback surface closed");
  }
}

impl Drop for PlaybackSurface {
  fn drop(&mut self) {
    self.teardown();
  }
}
