// src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::store::ParseError;

/// Failures reported by the OS hotkey facility.
#[derive(Debug, Error, Clone)]
pub enum BinderError {
    /// The OS refused the combination: already claimed by another process,
    /// or not expressible as a system hotkey.
    #[error("could not bind '{key}': {reason}")]
    Rejected { key: String, reason: String },

    #[error("'{0}' has no active binding")]
    NotBound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("store I/O failed on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of a rejected registry mutation. Validation failures leave the
/// registry exactly as it was; the caller surfaces the message and keeps
/// the user's input around for correction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("shortcut and text must both be non-empty")]
    EmptyInput,

    #[error("'{0}' is reserved by the system")]
    Reserved(String),

    #[error("'{0}' is already in use")]
    Duplicate(String),

    #[error("'{0}' is not registered")]
    NotFound(String),

    #[error(transparent)]
    Binding(#[from] BinderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, Clone)]
pub enum KeyboardError {
    #[error("input synthesis failed: {0}")]
    Input(String),
}

#[derive(Debug, Error)]
pub enum EzTextError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Binder(#[from] BinderError),

    #[error(transparent)]
    Keyboard(#[from] KeyboardError),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("settings serialization error: {source}")]
    SerdeJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("failed to parse version from tag '{tag}': {reason}")]
    VersionParse { tag: String, reason: String },

    #[error("could not find user configuration directory")]
    ConfigDir,

    #[error("process management error: {0}")]
    Process(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

// Global Result type alias
pub type Result<T> = std::result::Result<T, EzTextError>;
