use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReiError {
    #[error("not initialized: run 'rei init'")]
    NotInitialized,

    #[error("invalid role '{0}': expected admin, manager, acquisitions, dispositions, or member")]
    InvalidRole(String),

    #[error("unknown tool: {0}")]
    InvalidTool(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("activity log error: {0}")]
    ActivityDb(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReiError>;
