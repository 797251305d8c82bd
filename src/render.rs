//! Host-facing GPU types.

use std::ffi::c_void;
use std::fmt;

/// Description of the drawable the next frame is rendered into.
///
/// A per-call value: the host supplies a fresh one on every `render` call and
/// the surface never stores it, so window resizes take effect on the next
/// paint with no extra plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTarget {
  /// OpenGL framebuffer object to draw into (0 = default framebuffer).
  pub fbo: i32,
  pub width: i32,
  pub height: i32,
}

/// OpenGL bootstrap parameters supplied by the host GUI.
///
/// The engine resolves every GL function through `get_proc_address` and never
/// links GL itself. The resolver is called during render-context creation,
/// always with the host's GL context current.
pub struct OpenGlInitParams {
  pub get_proc_address: Box<dyn FnMut(&str) -> *mut c_void>,
}

impl OpenGlInitParams {
  pub fn new(get_proc_address: impl FnMut(&str) -> *mut c_void + 'static) -> Self {
    Self {
      get_proc_address: Box::new(get_proc_address),
    }
  }
}

impl fmt::Debug for OpenGlInitParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OpenGlInitParams").finish_non_exhaustive()
  }
}
