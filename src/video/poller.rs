use crate::api::{GeminiClient, Operation};
use crate::error::{Result, VideoError};
use crate::idea::{GeneratedScript, VideoIdea};
use crate::prompts::{self, Avatar};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const NO_VIDEO_REASON: &str = "the AI was unable to produce a video, possibly due to internal errors or content safety filters. Please try a different script.";

/// Drives one video job from submission to a file on disk.
pub struct VideoPoller<'a> {
    client: &'a GeminiClient,
}

impl<'a> VideoPoller<'a> {
    pub fn new(client: &'a GeminiClient) -> Self {
        Self { client }
    }

    /// Start the job, poll until it is done, then download the result to `output_path`.
    ///
    /// `on_progress` receives every user-facing status line.
    pub async fn produce<F>(
        &self,
        idea: &VideoIdea,
        script: &GeneratedScript,
        language: &str,
        avatar: Avatar,
        output_path: &Path,
        mut on_progress: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(&str),
    {
        on_progress(prompts::INITIATING_MESSAGE);
        let operation = self
            .client
            .start_video(idea, script, language, avatar)
            .await?;

        let operation = self.wait_for_operation(operation, &mut on_progress).await?;

        if let Some(error) = &operation.error {
            return Err(VideoError::VideoGenerationError(format!(
                "Operation finished with an error: (Code {}) {}",
                error.code, error.message
            )));
        }

        let uri = operation.video_uri().ok_or_else(|| {
            warn!("Video generation finished without a valid video URI: {:?}", operation);
            VideoError::VideoGenerationError(NO_VIDEO_REASON.to_string())
        })?;

        on_progress(prompts::DOWNLOADING_MESSAGE);
        let bytes = self.client.download_video(uri).await?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, &bytes).await?;
        info!("Video saved to: {} ({} bytes)", output_path.display(), bytes.len());

        Ok(output_path.to_path_buf())
    }

    /// Poll at the configured fixed interval until the operation reports `done`.
    pub async fn wait_for_operation<F>(
        &self,
        mut operation: Operation,
        on_progress: &mut F,
    ) -> Result<Operation>
    where
        F: FnMut(&str),
    {
        let settings = self.client.settings();
        let max_polls = settings.max_polls;
        let mut message_index = 0;
        let mut last_error = None;

        for poll in 0..max_polls {
            if operation.done {
                return Ok(operation);
            }

            tokio::time::sleep(settings.poll_interval).await;

            match self.client.get_operation(&operation).await {
                Ok(next) => {
                    operation = next;
                    last_error = None;
                }
                Err(e) => {
                    warn!("Failed to get operation status (check {}/{}): {}", poll + 1, max_polls, e);
                    last_error = Some(e.to_string());
                    continue;
                }
            }

            let message = prompts::progress_message(message_index);
            message_index += 1;
            info!("{} (check {}/{})", message, poll + 1, max_polls);
            on_progress(message);
        }

        if operation.done {
            Ok(operation)
        } else {
            Err(VideoError::Timeout {
                polls: max_polls,
                last_error,
            })
        }
    }
}
