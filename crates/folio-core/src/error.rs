use thiserror::Error;

use crate::types::{Action, ResourceKind};

/// Failures of the permission model itself. None of these involve I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("no permission template registered for resource kind `{0}`")]
    InvalidKind(ResourceKind),

    #[error("unrecognized permission code: {0}")]
    UnrecognizedCode(String),

    #[error("unrecognized action `{0}`: expected add, view, change or delete")]
    UnrecognizedAction(String),

    #[error("template `{template}` is registered for both `{existing}` and `{incoming}`")]
    AmbiguousTemplate {
        template: String,
        existing: ResourceKind,
        incoming: ResourceKind,
    },

    #[error("resource kind `{0}` is already registered")]
    DuplicateKind(ResourceKind),

    #[error("malformed permission template `{0}`: expected `%s_<noun>`")]
    MalformedTemplate(String),

    #[error("permission registry queried before a session was initialized")]
    NotInitialized,

    #[error("action `{0}` is not supported for object-level checks")]
    UnsupportedAction(Action),
}

#[derive(Debug, Error)]
pub enum FolioError {
    #[error(transparent)]
    Permission(#[from] PermissionError),

    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}, run `folio init` first")]
    ConfigNotFound(String),

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    // Serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Edit workflow
    #[error("Invalid dialog mode: {0}")]
    InvalidDialogMode(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("CRUD service error: {0}")]
    Crud(String),
}

pub type Result<T> = std::result::Result<T, FolioError>;
