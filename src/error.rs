use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Quote error: {0}")]
    Quote(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
