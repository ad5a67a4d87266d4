#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// 远端拒绝了请求，消息原样透出
    #[error("{0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid entry: {0}")]
    Validation(String),

    #[error("a write is already in flight for: {0}")]
    WriteInFlight(String),

    #[error("delete is not available on the new-entry editor")]
    DeleteUnavailable,

    #[error("no editor for key: {0}")]
    UnknownRow(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
