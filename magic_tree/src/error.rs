//! Engine error types.
//!
//! Only start-up can fail hard.  Everything that goes wrong per frame is
//! either an [`InferenceError`] (logged, counted, previous hands kept) or a
//! missing resource (logged once, drawn as a placeholder).

use std::path::PathBuf;

use thiserror::Error;
use tree_field::FieldError;

/// Failures that stop the application before or while it starts.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("landmark model failed to load: {0}")]
    ModelLoad(String),

    #[error("could not open preview window: {0}")]
    Window(String),

    #[error("invalid field configuration: {0}")]
    Field(#[from] FieldError),

    #[error("could not read config {path}: {source}")]
    ConfigIo {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    ConfigParse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("landmark source thread panicked")]
    SourcePanicked,
}

/// A single inference frame that produced no usable result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Landmarks(#[from] hand_gesture::LandmarkError),
}
