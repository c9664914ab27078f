//! Error types for the stage

use thiserror::Error;

/// Result type for stage setup
pub type StageResult<T> = Result<T, StageError>;

/// Asset loads that can fail without stopping the page.
/// Both kinds are logged and leave their slot empty.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("model load failed ({url}): {reason}")]
    Model { url: String, reason: String },

    #[error("environment load failed ({url}): {reason}")]
    Environment { url: String, reason: String },
}

/// Errors that abort `run()` before the frame loop starts
#[derive(Error, Debug)]
pub enum StageError {
    #[error("no global window")]
    NoWindow,

    #[error("no document on window")]
    NoDocument,

    #[error("canvas not found: {0}")]
    CanvasNotFound(String),

    #[error("WebGL2 unavailable: {0}")]
    WebGl(String),

    #[error("shader error: {0}")]
    Shader(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(target_arch = "wasm32")]
impl From<StageError> for wasm_bindgen::JsValue {
    fn from(e: StageError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
