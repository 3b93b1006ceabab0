use crate::error::{Result, VideoError};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Runtime settings shared by the client and the video poller.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub video_model: String,
    /// Fixed wait between operation status checks.
    pub poll_interval: Duration,
    /// Upper bound on status checks before giving up.
    pub max_polls: u32,
    pub work_dir: PathBuf,
}

impl Settings {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_interval: Duration::from_secs(10),
            max_polls: 90,
            work_dir: PathBuf::from("./output"),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}

/// Resolve the API key: explicit flag first, then the environment.
///
/// `lookup` is the environment accessor so callers (and tests) can swap it.
pub fn resolve_api_key<F>(flag: Option<String>, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = flag.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    API_KEY_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            VideoError::EnvError(format!(
                "API key not found. Please set it via --api-key or the {} environment variable",
                API_KEY_VARS.join(" / ")
            ))
        })
}
