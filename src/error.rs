use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("API Limit Reached: You've exceeded your current usage quota. Please check your plan and billing details.")]
    QuotaExceeded,

    #[error("Please enter a topic to generate ideas.")]
    EmptyTopic,

    #[error("Idea {0} not found")]
    IdeaNotFound(usize),

    #[error("Script error: {0}")]
    SceneError(String),

    #[error("Video generation error: {0}")]
    VideoGenerationError(String),

    #[error(
        "Video generation did not finish after {polls} status checks (last status error: {})",
        .last_error.as_deref().unwrap_or("none")
    )]
    Timeout {
        polls: u32,
        last_error: Option<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

pub type Result<T> = std::result::Result<T, VideoError>;
