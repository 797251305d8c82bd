//! In-process libmpv engine backend, enabled with the `libmpv` cargo feature.
//!
//! Drives the raw client API: `mpv_create` / `mpv_initialize` for the
//! session, `mpv_render_context_create` with the OpenGL render API for the
//! GPU side, `mpv_wait_event` with a zero timeout for the event stream, and
//! `mpv_terminate_destroy` for release. Instructions are passed in argv form
//! through `mpv_command`, so the encoding in `protocol.rs` maps straight onto
//! the engine's command names.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

use libmpv2_sys::*;

use crate::config::SurfaceOptions;
use crate::engine::{Engine, EngineBackend, EngineError, ErrorKind, RenderContext};
use crate::protocol::{EngineEvent, Instruction, PropertyValue};
use crate::render::{FrameTarget, OpenGlInitParams};

/// Backend minting in-process mpv sessions.
#[derive(Debug, Default)]
pub struct LibmpvBackend;

fn error_text(code: c_int) -> String {
  unsafe {
    let text = mpv_error_string(code);
    if text.is_null() {
      format!("mpv error {code}")
    } else {
      CStr::from_ptr(text).to_string_lossy().into_owned()
    }
  }
}

fn engine_err(kind: ErrorKind, what: &str, code: c_int) -> EngineError {
  EngineError::new(kind, format!("{what}: {}", error_text(code)))
}

fn c_string(kind: ErrorKind, value: &str) -> Result<CString, EngineError> {
  CString::new(value).map_err(|_| EngineError::new(kind, format!("NUL byte in {value:?}")))
}

impl EngineBackend for LibmpvBackend {
  fn create(&self) -> Result<Box<dyn Engine>, EngineError> {
    let handle = unsafe { mpv_create() };
    if handle.is_null() {
      return Err(EngineError::new(
        ErrorKind::Create,
        "mpv_create returned null",
      ));
    }
    Ok(Box::new(LibmpvEngine { handle }))
  }
}

struct LibmpvEngine {
  handle: *mut mpv_handle,
}

type ProcResolver = Box<dyn FnMut(&str) -> *mut c_void>;

unsafe extern "C" fn get_proc_address_trampoline(
  ctx: *mut c_void,
  name: *const c_char,
) -> *mut c_void {
  let resolver = &mut *(ctx as *mut ProcResolver);
  match CStr::from_ptr(name).to_str() {
    Ok(name) => resolver(name),
    Err(_) => ptr::null_mut(),
  }
}

unsafe extern "C" fn update_trampoline(ctx: *mut c_void) {
  let callback = &*(ctx as *const Box<dyn Fn() + Send + Sync>);
  callback();
}

impl LibmpvEngine {
  fn set_option(&self, name: &str, value: &str) -> Result<(), EngineError> {
    let name_c = c_string(ErrorKind::Init, name)?;
    let value_c = c_string(ErrorKind::Init, value)?;
    let rc = unsafe { mpv_set_option_string(self.handle, name_c.as_ptr(), value_c.as_ptr()) };
    if rc < 0 {
      return Err(engine_err(ErrorKind::Init, name, rc));
    }
    Ok(())
  }
}

impl Engine for LibmpvEngine {
  fn init(&mut self, options: &SurfaceOptions) -> Result<(), EngineError> {
    for (name, value) in options.option_pairs() {
      self.set_option(&name, &value)?;
    }
    let rc = unsafe { mpv_initialize(self.handle) };
    if rc < 0 {
      return Err(engine_err(ErrorKind::Init, "mpv_initialize", rc));
    }
    log::info!("mpv core initialized");
    Ok(())
  }

  fn create_render_context(
    &mut self,
    gl: OpenGlInitParams,
  ) -> Result<Box<dyn RenderContext>, EngineError> {
    // mpv keeps calling the resolver through this pointer for the lifetime
    // of the render context; the context reclaims it on release
    let resolver: *mut ProcResolver = Box::into_raw(Box::new(gl.get_proc_address));

    let api_type = c_string(ErrorKind::Render, "opengl")?;
    let mut init_params = mpv_opengl_init_params {
      get_proc_address: Some(get_proc_address_trampoline),
      get_proc_address_ctx: resolver as *mut c_void,
    };
    let mut params = [
      mpv_render_param {
        type_: mpv_render_param_type_MPV_RENDER_PARAM_API_TYPE,
        data: api_type.as_ptr() as *mut c_void,
      },
      mpv_render_param {
        type_: mpv_render_param_type_MPV_RENDER_PARAM_OPENGL_INIT_PARAMS,
        data: &mut init_params as *mut mpv_opengl_init_params as *mut c_void,
      },
      mpv_render_param {
        type_: mpv_render_param_type_MPV_RENDER_PARAM_INVALID,
        data: ptr::null_mut(),
      },
    ];

    let mut ctx: *mut mpv_render_context = ptr::null_mut();
    let rc = unsafe { mpv_render_context_create(&mut ctx, self.handle, params.as_mut_ptr()) };
    if rc < 0 {
      unsafe { drop(Box::from_raw(resolver)) };
      return Err(engine_err(
        ErrorKind::Render,
        "mpv_render_context_create",
        rc,
      ));
    }

    log::info!("mpv OpenGL render context created");
    Ok(Box::new(LibmpvRenderContext {
      ctx,
      resolver,
      callback: None,
    }))
  }

  fn send(&mut self, instruction: &Instruction) -> Result<(), EngineError> {
    // argv form: every argument as text, like the command line
    let mut args = Vec::with_capacity(instruction.args.len());
    for value in &instruction.args {
      let text = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
      };
      args.push(c_string(ErrorKind::Command, &text)?);
    }
    let mut argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(ptr::null());

    let rc = unsafe { mpv_command(self.handle, argv.as_mut_ptr()) };
    if rc < 0 {
      return Err(engine_err(ErrorKind::Command, instruction.name(), rc));
    }
    Ok(())
  }

  fn get_property(&mut self, name: &str) -> Result<PropertyValue, EngineError> {
    let name_c = c_string(ErrorKind::Property, name)?;
    let mut out: *mut c_char = ptr::null_mut();
    let rc = unsafe {
      mpv_get_property(
        self.handle,
        name_c.as_ptr(),
        mpv_format_MPV_FORMAT_STRING,
        &mut out as *mut *mut c_char as *mut c_void,
      )
    };
    if rc < 0 {
      return Err(engine_err(ErrorKind::Property, name, rc));
    }
    let text = unsafe {
      let text = CStr::from_ptr(out).to_string_lossy().into_owned();
      mpv_free(out as *mut c_void);
      text
    };
    Ok(parse_property(&text))
  }

  fn observe_property(&mut self, name: &str) -> Result<(), EngineError> {
    let name_c = c_string(ErrorKind::Property, name)?;
    let rc = unsafe {
      mpv_observe_property(self.handle, 0, name_c.as_ptr(), mpv_format_MPV_FORMAT_STRING)
    };
    if rc < 0 {
      return Err(engine_err(ErrorKind::Property, name, rc));
    }
    Ok(())
  }

  fn poll_event(&mut self) -> Option<EngineEvent> {
    loop {
      let event = unsafe { &*mpv_wait_event(self.handle, 0.0) };
      match event.event_id {
        mpv_event_id_MPV_EVENT_NONE => return None,
        mpv_event_id_MPV_EVENT_FILE_LOADED => return Some(EngineEvent::FileLoaded),
        mpv_event_id_MPV_EVENT_SHUTDOWN => return Some(EngineEvent::Shutdown),
        mpv_event_id_MPV_EVENT_END_FILE => {
          let end = unsafe { &*(event.data as *mut mpv_event_end_file) };
          return Some(EngineEvent::EndFile {
            reason: end_file_reason(end.reason as u32),
          });
        }
        mpv_event_id_MPV_EVENT_PROPERTY_CHANGE => {
          let prop = unsafe { &*(event.data as *mut mpv_event_property) };
          let name = unsafe { CStr::from_ptr(prop.name).to_string_lossy().into_owned() };
          let value = unsafe { property_event_value(prop) };
          return Some(EngineEvent::PropertyChange { name, value });
        }
        // uninteresting event, keep draining
        _ => continue,
      }
    }
  }

  fn release(&mut self) {
    if !self.handle.is_null() {
      unsafe { mpv_terminate_destroy(self.handle) };
      self.handle = ptr::null_mut();
      log::info!("mpv core destroyed");
    }
  }
}

impl Drop for LibmpvEngine {
  fn drop(&mut self) {
    self.release();
  }
}

fn parse_property(text: &str) -> PropertyValue {
  match text {
    "yes" => PropertyValue::Bool(true),
    "no" => PropertyValue::Bool(false),
    _ => text
      .parse::<f64>()
      .map(PropertyValue::Number)
      .unwrap_or_else(|_| PropertyValue::String(text.to_string())),
  }
}

unsafe fn property_event_value(prop: &mpv_event_property) -> PropertyValue {
  if prop.format != mpv_format_MPV_FORMAT_STRING || prop.data.is_null() {
    return PropertyValue::Null;
  }
  let text = *(prop.data as *mut *mut c_char);
  if text.is_null() {
    return PropertyValue::Null;
  }
  parse_property(&CStr::from_ptr(text).to_string_lossy())
}

fn end_file_reason(reason: u32) -> Option<String> {
  let text = match reason {
    mpv_end_file_reason_MPV_END_FILE_REASON_EOF => "eof",
    mpv_end_file_reason_MPV_END_FILE_REASON_STOP => "stop",
    mpv_end_file_reason_MPV_END_FILE_REASON_QUIT => "quit",
    mpv_end_file_reason_MPV_END_FILE_REASON_ERROR => "error",
    mpv_end_file_reason_MPV_END_FILE_REASON_REDIRECT => "redirect",
    _ => return None,
  };
  Some(text.to_string())
}

struct LibmpvRenderContext {
  ctx: *mut mpv_render_context,
  resolver: *mut ProcResolver,
  callback: Option<*mut Box<dyn Fn() + Send + Sync>>,
}

impl RenderContext for LibmpvRenderContext {
  fn set_update_callback(&mut self, callback: Box<dyn Fn() + Send + Sync>) {
    let boxed = Box::into_raw(Box::new(callback));
    unsafe {
      mpv_render_context_set_update_callback(self.ctx, Some(update_trampoline), boxed as *mut c_void);
    }
    if let Some(old) = self.callback.replace(boxed) {
      // mpv now holds the new pointer, the old box can go
      unsafe { drop(Box::from_raw(old)) };
    }
  }

  fn render(&mut self, target: FrameTarget) -> Result<(), EngineError> {
    let mut fbo = mpv_opengl_fbo {
      fbo: target.fbo,
      w: target.width,
      h: target.height,
      internal_format: 0,
    };
    let mut params = [
      mpv_render_param {
        type_: mpv_render_param_type_MPV_RENDER_PARAM_OPENGL_FBO,
        data: &mut fbo as *mut mpv_opengl_fbo as *mut c_void,
      },
      mpv_render_param {
        type_: mpv_render_param_type_MPV_RENDER_PARAM_INVALID,
        data: ptr::null_mut(),
      },
    ];
    let rc = unsafe { mpv_render_context_render(self.ctx, params.as_mut_ptr()) };
    if rc < 0 {
      return Err(engine_err(
        ErrorKind::Render,
        "mpv_render_context_render",
        rc,
      ));
    }
    Ok(())
  }

  fn release(&mut self) {
    if !self.ctx.is_null() {
      unsafe {
        mpv_render_context_set_update_callback(self.ctx, None, ptr::null_mut());
        mpv_render_context_free(self.ctx);
      }
      self.ctx = ptr::null_mut();
      log::info!("mpv render context freed");
    }
    if let Some(callback) = self.callback.take() {
      unsafe { drop(Box::from_raw(callback)) };
    }
    if !self.resolver.is_null() {
      unsafe { drop(Box::from_raw(self.resolver)) };
      self.resolver = ptr::null_mut();
    }
  }
}

impl Drop for LibmpvRenderContext {
  fn drop(&mut self) {
    self.release();
  }
}
