use std::fs;
use std::path::Path;

use num_complex::Complex;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::value::Value;

/// On-disk shape of one number: a split complex pair or a plain float.
/// Anything else in the field is kept and resolved on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredNumber {
    Complex { real: f64, imag: f64 },
    Real(f64),
    Other(serde_json::Value),
}

impl Default for StoredNumber {
    fn default() -> Self {
        StoredNumber::Real(0.0)
    }
}

impl StoredNumber {
    pub fn from_value(v: &Value) -> StoredNumber {
        match v {
            Value::Complex(c) => StoredNumber::Complex {
                real: c.re,
                imag: c.im,
            },
            Value::Int(i) => StoredNumber::Real(i.to_f64().unwrap_or(0.0)),
            Value::Float(g) => StoredNumber::Real(*g),
            Value::Str(..) => StoredNumber::Real(0.0),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            StoredNumber::Complex { real, imag } => Value::Complex(Complex::new(real, imag)),
            StoredNumber::Real(f) => Value::Float(f),
            // a string gets one float-parse attempt; everything else resets
            StoredNumber::Other(v) => {
                let f = v
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .or_else(|| v.as_f64())
                    .unwrap_or(0.0);
                Value::Float(f)
            }
        }
    }
}

/// The exact serializable projection of engine state
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub memory_value: StoredNumber,
    #[serde(default)]
    pub last_answer: StoredNumber,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

/// Best-effort write: persistence is advisory and never surfaces a failure
pub fn save_to(path: &Path, snapshot: &SessionSnapshot) {
    let text = match serde_json::to_string_pretty(snapshot) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to serialize session");
            return;
        }
    };
    if let Err(e) = fs::write(path, text) {
        warn!(path = %path.display(), error = %e, "failed to write session file");
    }
}

/// A missing, unreadable, or corrupt file yields the empty default snapshot
pub fn load_from(path: &Path) -> SessionSnapshot {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(..) => return SessionSnapshot::default(),
    };
    match serde_json::from_str(&text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "corrupt session file, starting clean");
            SessionSnapshot::default()
        }
    }
}
