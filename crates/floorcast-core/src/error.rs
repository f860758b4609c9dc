use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloorcastError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Classify error: {0}")]
    Classify(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FloorcastError>;
