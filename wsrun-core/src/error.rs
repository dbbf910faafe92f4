//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {context}: {error}")]
    Json {
        error: serde_json::Error,
        context: String,
    },

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Unable to find workspace root starting from {start}. Expected a 'package.json' declaring 'workspaces' in an ancestor directory.")]
    RootNotFound { start: PathBuf },

    #[error("Invalid package descriptor {path}: {message}")]
    DescriptorParse { path: PathBuf, message: String },

    #[error("Invalid config file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Invalid workspace glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Task execution failed for {workspace}::{task}: {message}")]
    TaskExecution {
        workspace: String,
        task: String,
        message: String,
    },
}

impl Error {
    pub(crate) fn json(error: serde_json::Error, context: impl Into<String>) -> Self {
        Error::Json {
            error,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
