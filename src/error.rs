//! Error types for block construction and the command pipeline

use thiserror::Error;

use crate::cloud::CloudError;
use crate::config::ConfigError;

/// Errors raised while constructing or extending a [`Block`](crate::hcl::Block)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidBlockError {
    #[error("missing required field: kind")]
    MissingKind,

    #[error("unexpected field: {field}")]
    UnexpectedField { field: String },

    #[error("expected a block, found {found}")]
    NotABlock { found: &'static str },

    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

/// Errors that can stop a command
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid block: {0}")]
    Block(#[from] InvalidBlockError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A Terraform output the command depends on could not be read
    #[error("terraform output '{name}' is unavailable")]
    MissingOutput { name: String },
}
