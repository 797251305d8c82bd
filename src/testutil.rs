//! In-memory fake engine backend for lifecycle tests.
//!
//! The fake journals every interaction and panics on double release, which is
//! what lets the surface tests assert "exactly one engine and one context
//! while ready, zero after teardown, released exactly once".

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SurfaceOptions;
use crate::engine::{Engine, EngineBackend, EngineError, ErrorKind, RenderContext};
use crate::protocol::{EngineEvent, Instruction, PropertyValue};
use crate::render::{FrameTarget, OpenGlInitParams};

/// Everything the fake backend observed, shared with the test.
#[derive(Default)]
pub struct Journal {
  pub engines_created: usize,
  pub engines_released: usize,
  pub contexts_created: usize,
  pub contexts_released: usize,
  pub applied_options: Vec<(String, String)>,
  pub sent: Vec<Instruction>,
  pub observed: Vec<String>,
  pub rendered: Vec<FrameTarget>,
  pub update_callback: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Journal {
  pub fn live_engines(&self) -> usize {
    self.engines_created - self.engines_released
  }

  pub fn live_contexts(&self) -> usize {
    self.contexts_created - self.contexts_released
  }
}

/// Proc-address resolver stub for tests; the fake never dereferences it.
pub fn gl_params() -> OpenGlInitParams {
  OpenGlInitParams::new(|_| std::ptr::null_mut())
}

#[derive(Default)]
pub struct FakeBackend {
  journal: Arc<Mutex<Journal>>,
  fail_create: bool,
  fail_init: bool,
  fail_render_context: bool,
  fail_render: bool,
  context_lost: Arc<AtomicBool>,
  events: Vec<EngineEvent>,
  properties: HashMap<String, PropertyValue>,
}

impl FakeBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn journal(&self) -> Arc<Mutex<Journal>> {
    self.journal.clone()
  }

  /// Flag the test flips to simulate GPU context invalidation.
  pub fn context_lost(&self) -> Arc<AtomicBool> {
    self.context_lost.clone()
  }

  pub fn fail_create(mut self) -> Self {
    self.fail_create = true;
    self
  }

  pub fn fail_init(mut self) -> Self {
    self.fail_init = true;
    self
  }

  pub fn fail_render_context(mut self) -> Self {
    self.fail_render_context = true;
    self
  }

  pub fn fail_render(mut self) -> Self {
    self.fail_render = true;
    self
  }

  pub fn with_event(mut self, event: EngineEvent) -> Self {
    self.events.push(event);
    self
  }

  pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
    self.properties.insert(name.to_string(), value);
    self
  }
}

impl EngineBackend for FakeBackend {
  fn create(&self) -> Result<Box<dyn Engine>, EngineError> {
    if self.fail_create {
      return Err(EngineError::new(
        ErrorKind::Create,
        "simulated allocation failure",
      ));
    }
    self.journal.lock().engines_created += 1;
    Ok(Box::new(FakeEngine {
      journal: self.journal.clone(),
      fail_init: self.fail_init,
      fail_render_context: self.fail_render_context,
      fail_render: self.fail_render,
      context_lost: self.context_lost.clone(),
      events: self.events.clone().into(),
      properties: self.properties.clone(),
      released: false,
    }))
  }
}

struct FakeEngine {
  journal: Arc<Mutex<Journal>>,
  fail_init: bool,
  fail_render_context: bool,
  fail_render: bool,
  context_lost: Arc<AtomicBool>,
  events: VecDeque<EngineEvent>,
  properties: HashMap<String, PropertyValue>,
  released: bool,
}

impl Engine for FakeEngine {
  fn init(&mut self, options: &SurfaceOptions) -> Result<(), EngineError> {
    if self.fail_init {
      return Err(EngineError::new(
        ErrorKind::Init,
        "simulated configuration rejection",
      ));
    }
    self.journal.lock().applied_options = options.option_pairs();
    Ok(())
  }

  fn create_render_context(
    &mut self,
    _gl: OpenGlInitParams,
  ) -> Result<Box<dyn RenderContext>, EngineError> {
    if self.fail_render_context {
      return Err(EngineError::new(
        ErrorKind::Render,
        "simulated context creation failure",
      ));
    }
    self.journal.lock().contexts_created += 1;
    Ok(Box::new(FakeRenderContext {
      journal: self.journal.clone(),
      fail_render: self.fail_render,
      context_lost: self.context_lost.clone(),
      released: false,
    }))
  }

  fn send(&mut self, instruction: &Instruction) -> Result<(), EngineError> {
    self.journal.lock().sent.push(instruction.clone());
    Ok(())
  }

  fn get_property(&mut self, name: &str) -> Result<PropertyValue, EngineError> {
    self
      .properties
      .get(name)
      .cloned()
      .ok_or_else(|| EngineError::new(ErrorKind::Property, format!("no such property: {name}")))
  }

  fn observe_property(&mut self, name: &str) -> Result<(), EngineError> {
    self.journal.lock().observed.push(name.to_string());
    Ok(())
  }

  fn poll_event(&mut self) -> Option<EngineEvent> {
    self.events.pop_front()
  }

  fn release(&mut self) {
    assert!(!self.released, "engine released twice");
    self.released = true;
    self.journal.lock().engines_released += 1;
  }
}

struct FakeRenderContext {
  journal: Arc<Mutex<Journal>>,
  fail_render: bool,
  context_lost: Arc<AtomicBool>,
  released: bool,
}

impl RenderContext for FakeRenderContext {
  fn set_update_callback(&mut self, callback: Box<dyn Fn() + Send + Sync>) {
    self.journal.lock().update_callback = Some(Arc::from(callback));
  }

  fn render(&mut self, target: FrameTarget) -> Result<(), EngineError> {
    if self.context_lost.load(Ordering::SeqCst) {
      return Err(EngineError::new(
        ErrorKind::ContextLost,
        "simulated context loss",
      ));
    }
    if self.fail_render {
      return Err(EngineError::new(
        ErrorKind::Render,
        "simulated render failure",
      ));
    }
    self.journal.lock().rendered.push(target);
    Ok(())
  }

  fn release(&mut self) {
    assert!(!self.released, "render context released twice");
    self.released = true;
    self.journal.lock().contexts_released += 1;
  }
}
