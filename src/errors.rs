use thiserror::Error;

/// Errors that can occur while loading schema metadata or resolving
/// relationships.
#[derive(Error, Debug)]
pub enum RelmapError {
    #[error("cannot find primary key for {collection}")]
    MissingPrimaryKey { collection: String },

    #[error("catalog error: {message} (path: {path})")]
    Catalog { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `RelmapError`.
pub type Result<T> = std::result::Result<T, RelmapError>;
