use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("story not found: {0}")]
    StoryNotFound(String),

    #[error("invalid story id '{0}': expected PREFIX-NNNN (e.g. US-0001)")]
    InvalidStoryId(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("story directory not found: {0}")]
    SourceDirMissing(String),

    #[error("invalid config at {path}: {message}")]
    Config { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BacklogError>;
