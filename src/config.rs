//! Engine options applied before initialization.

use serde::{Deserialize, Serialize};

/// Options handed to the engine during `initialize`.
///
/// These are start-up options (the kind that must be set before the engine
/// initializes), not runtime properties; runtime state changes go through
/// `Command` submission instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SurfaceOptions {
  /// Video output driver. Embedded rendering requires the library output.
  pub video_output: String,

  /// Hardware decoding mode ("auto", "no", or a specific API name).
  pub hardware_decoding: String,

  /// Start with playback paused.
  pub start_paused: bool,

  /// Initial volume (0-100).
  pub volume: f64,

  /// Free-form extra engine options applied verbatim, in order, after the
  /// named ones above.
  pub extra_options: Vec<(String, String)>,
}

fn flag(value: bool) -> String {
  if value { "yes" } else { "no" }.to_string()
}

impl Default for SurfaceOptions {
  fn default() -> Self {
    Self {
      video_output: "libmpv".to_string(),
      hardware_decoding: "auto".to_string(),
      start_paused: false,
      volume: 100.0,
      extra_options: Vec::new(),
    }
  }
}

impl SurfaceOptions {
  /// Validate option values.
  pub fn validate(&self) -> Result<(), String> {
    if self.video_output.trim().is_empty() {
      return Err("video output driver cannot be empty".to_string());
    }
    if self.hardware_decoding.trim().is_empty() {
      return Err("hardware decoding mode cannot be empty".to_string());
    }
    if !(0.0..=100.0).contains(&self.volume) {
      return Err("volume must be between 0 and 100".to_string());
    }
    for (name, _) in &self.extra_options {
      if name.trim().is_empty() {
        return Err("extra option name cannot be empty".to_string());
      }
    }
    Ok(())
  }

  /// Flatten into engine (name, value) pairs in application order.
  pub fn option_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("vo".to_string(), self.video_output.clone()),
      ("hwdec".to_string(), self.hardware_decoding.clone()),
      ("pause".to_string(), flag(self.start_paused)),
      ("volume".to_string(), format!("{}", self.volume)),
    ];
    pairs.extend(self.extra_options.iter().cloned());
    pairs
  }
}
