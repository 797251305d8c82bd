//! Engine instruction encoding and event types.
//!
//! Commands use mpv's argv form: a JSON array whose first element is the
//! command name, e.g. `["loadfile", "movie.mp4"]` or
//! `["seek", 42.0, "absolute"]`. Flag values use the engine's canonical
//! `"yes"`/`"no"` text so string-command backends can pass arguments through
//! verbatim.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Global request ID counter for unique instruction identification.
static REQUEST_ID: AtomicI64 = AtomicI64::new(1);

/// Generate a unique request ID for engine instructions.
pub fn next_request_id() -> i64 {
  REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// Host-issued playback intent.
///
/// Each variant translates 1:1 into one engine instruction; `encode` does the
/// translation. Submission is fire-and-forget: acceptance means the engine
/// took the instruction, not that it finished (completion arrives later on
/// the engine's own event stream).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  /// Load a media path or URL for playback.
  Load(String),
  Play,
  Pause,
  /// Seek to an absolute position in seconds.
  Seek(f64),
  Stop,
  /// Set volume (0-100).
  SetVolume(f64),
}

impl Command {
  /// Encode into the engine's argv instruction form.
  pub fn encode(&self) -> Instruction {
    match self {
      Command::Load(path) => Instruction::loadfile(path),
      Command::Play => Instruction::set_pause(false),
      Command::Pause => Instruction::set_pause(true),
      Command::Seek(secs) => Instruction::seek(*secs),
      Command::Stop => Instruction::stop(),
      Command::SetVolume(volume) => Instruction::set_volume(*volume),
    }
  }
}

/// One encoded engine instruction.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
  pub args: Vec<serde_json::Value>,
  pub request_id: i64,
}

impl Instruction {
  /// Create a new instruction with auto-generated request ID.
  pub fn new(args: Vec<serde_json::Value>) -> Self {
    Self {
      args,
      request_id: next_request_id(),
    }
  }

  /// Load a file for playback.
  pub fn loadfile(path: &str) -> Self {
    Self::new(vec!["loadfile".into(), path.into()])
  }

  /// Set pause state.
  pub fn set_pause(paused: bool) -> Self {
    let flag = if paused { "yes" } else { "no" };
    Self::new(vec!["set_property".into(), "pause".into(), flag.into()])
  }

  /// Seek to absolute position in seconds.
  pub fn seek(secs: f64) -> Self {
    Self::new(vec!["seek".into(), secs.into(), "absolute".into()])
  }

  /// Stop playback and unload the current file.
  pub fn stop() -> Self {
    Self::new(vec!["stop".into()])
  }

  /// Set volume (0-100).
  pub fn set_volume(volume: f64) -> Self {
    Self::new(vec!["set_property".into(), "volume".into(), volume.into()])
  }

  /// Command name (first argv element), for logging.
  pub fn name(&self) -> &str {
    self
      .args
      .first()
      .and_then(serde_json::Value::as_str)
      .unwrap_or("")
  }
}

/// Typed engine property values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
  Bool(bool),
  Number(f64),
  String(String),
  /// Structured values carried as their JSON text.
  Json(String),
  Null,
}

impl From<serde_json::Value> for PropertyValue {
  fn from(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::Bool(b) => PropertyValue::Bool(b),
      serde_json::Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or(0.0)),
      serde_json::Value::String(s) => PropertyValue::String(s),
      serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
        PropertyValue::Json(value.to_string())
      }
      serde_json::Value::Null => PropertyValue::Null,
    }
  }
}

impl PropertyValue {
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      PropertyValue::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      PropertyValue::Bool(b) => Some(*b),
      _ => None,
    }
  }
}

/// Asynchronous notification from the engine's event stream.
///
/// Drained non-blockingly via `PlaybackSurface::poll_events`. This is how
/// completion of fire-and-forget commands is observed: a `Load` that started
/// playing shows up as `FileLoaded`, one that failed as
/// `EndFile { reason: Some("error") }`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
  /// A loaded file started playing.
  FileLoaded,
  /// Playback of the current file ended ("eof", "stop", "error", ...).
  EndFile { reason: Option<String> },
  /// An observed property changed value.
  PropertyChange { name: String, value: PropertyValue },
  /// The engine is shutting down on its own.
  Shutdown,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_loadfile_encoding() {
    let instr = Command::Load("movie.mp4".to_string()).encode();
    let json = serde_json::to_string(&instr).unwrap();
    assert!(json.contains("loadfile"));
    assert!(json.contains("movie.mp4"));
  }

  #[test]
  fn test_pause_uses_flag_text() {
    let instr = Command::Pause.encode();
    assert_eq!(instr.args[0], "set_property");
    assert_eq!(instr.args[1], "pause");
    assert_eq!(instr.args[2], "yes");

    let instr = Command::Play.encode();
    assert_eq!(instr.args[2], "no");
  }

  #[test]
  fn test_seek_is_absolute() {
    let instr = Command::Seek(42.5).encode();
    assert_eq!(instr.name(), "seek");
    assert_eq!(instr.args[1], 42.5);
    assert_eq!(instr.args[2], "absolute");
  }

  #[test]
  fn test_volume_encoding() {
    let instr = Command::SetVolume(80.0).encode();
    assert_eq!(instr.args[0], "set_property");
    assert_eq!(instr.args[1], "volume");
    assert_eq!(instr.args[2], 80.0);
  }

  #[test]
  fn test_request_ids_are_unique() {
    let a = Instruction::stop();
    let b = Instruction::stop();
    assert!(b.request_id > a.request_id);
  }

  #[test]
  fn test_property_value_from_json() {
    assert_eq!(
      PropertyValue::from(serde_json::json!(1.5)),
      PropertyValue::Number(1.5)
    );
    assert_eq!(
      PropertyValue::from(serde_json::json!(true)),
      PropertyValue::Bool(true)
    );
    assert_eq!(
      PropertyValue::from(serde_json::json!([1, 2])),
      PropertyValue::Json("[1,2]".to_string())
    );
    assert_eq!(PropertyValue::from(serde_json::Value::Null), PropertyValue::Null);
  }
}
