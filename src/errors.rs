//! Typed error hierarchy for the autodoc pipeline.
//!
//! Four enums cover the layers of the system:
//! - `BackendError`: a single call to a single model backend failed
//! - `ModelError`: the failover client gave up
//! - `ConfigError`: `autodoc.toml` could not be loaded or is invalid
//! - `PipelineError`: a pipeline stage aborted

use thiserror::Error;

/// Failure of one request against one backend model.
///
/// These are transient from the pipeline's point of view: the failover
/// client absorbs them and moves to the next backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Completion contained no text")]
    EmptyCompletion,
}

/// Errors surfaced by a `LanguageModel`.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("No models available for use (pool exhausted after {attempts} failed attempts)")]
    PoolExhausted { attempts: usize },

    #[error("Model {model} failed: {source}")]
    Backend {
        model: String,
        #[source]
        source: BackendError,
    },
}

/// Errors from loading or validating `autodoc.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse autodoc.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Errors that abort a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Nothing to process: input produced no chunks")]
    EmptyInput,

    #[error("Required artifact missing at {path}")]
    MissingArtifact { path: std::path::PathBuf },
}
