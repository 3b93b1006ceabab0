use crate::error::{Result, VideoError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A generated video concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoIdea {
    pub title: String,
    /// Opening line for the first 10-15 seconds
    pub hook: String,
    pub description: String,
    /// Key talking points, in order
    pub script_outline: Vec<String>,
    pub target_audience: String,
    pub thumbnail_suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeasResponse {
    pub video_ideas: Vec<VideoIdea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptScene {
    #[serde(deserialize_with = "scene_number")]
    pub scene: u32,
    pub visual_description: String,
    pub voiceover: String,
}

/// The schema types scene numbers as NUMBER, so `1.0` shows up as often as `1`.
fn scene_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Ok(value.round() as u32)
    } else {
        Err(serde::de::Error::custom(format!("invalid scene number: {value}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub title: String,
    pub script: Vec<ScriptScene>,
}

impl GeneratedScript {
    /// Plain-text rendering used for the "copy full script" output.
    pub fn to_clipboard_text(&self) -> String {
        self.script
            .iter()
            .map(|s| {
                format!(
                    "Scene {}\nVisual: {}\nVoiceover: {}",
                    s.scene, s.visual_description, s.voiceover
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardStatus {
    Idle,
    GeneratingContent,
    GeneratingVideo { progress: String },
    VideoReady { path: PathBuf },
}

/// One idea plus everything produced for it during the session.
#[derive(Debug, Clone)]
pub struct IdeaCard {
    pub idea: VideoIdea,
    pub generated_script: Option<GeneratedScript>,
    pub thumbnail: Option<Vec<u8>>,
    pub status: CardStatus,
}

impl IdeaCard {
    pub fn new(idea: VideoIdea) -> Self {
        Self {
            idea,
            generated_script: None,
            thumbnail: None,
            status: CardStatus::Idle,
        }
    }

    pub fn has_generated_content(&self) -> bool {
        self.generated_script.is_some() && self.thumbnail.is_some()
    }

    pub fn progress(&self) -> Option<&str> {
        match &self.status {
            CardStatus::GeneratingVideo { progress } => Some(progress),
            _ => None,
        }
    }

    pub fn video_path(&self) -> Option<&PathBuf> {
        match &self.status {
            CardStatus::VideoReady { path } => Some(path),
            _ => None,
        }
    }
}

/// Session state for a single topic run. Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct IdeaBoard {
    cards: Vec<IdeaCard>,
}

impl IdeaBoard {
    pub fn from_response(response: IdeasResponse) -> Result<Self> {
        if response.video_ideas.is_empty() {
            return Err(VideoError::ApiError(
                "Failed to generate content. The AI returned an unexpected format.".to_string(),
            ));
        }

        Ok(Self {
            cards: response.video_ideas.into_iter().map(IdeaCard::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[IdeaCard] {
        &self.cards
    }

    pub fn ideas(&self) -> Vec<&VideoIdea> {
        self.cards.iter().map(|c| &c.idea).collect()
    }

    pub fn card(&self, index: usize) -> Result<&IdeaCard> {
        self.cards.get(index).ok_or(VideoError::IdeaNotFound(index))
    }

    pub fn card_mut(&mut self, index: usize) -> Result<&mut IdeaCard> {
        self.cards
            .get_mut(index)
            .ok_or(VideoError::IdeaNotFound(index))
    }

    pub fn begin_content(&mut self, index: usize) -> Result<&VideoIdea> {
        let card = self.card_mut(index)?;
        card.status = CardStatus::GeneratingContent;
        Ok(&card.idea)
    }

    pub fn finish_content(
        &mut self,
        index: usize,
        script: GeneratedScript,
        thumbnail: Vec<u8>,
    ) -> Result<()> {
        let card = self.card_mut(index)?;
        card.generated_script = Some(script);
        card.thumbnail = Some(thumbnail);
        card.status = CardStatus::Idle;
        Ok(())
    }

    /// Content generation failed; the idea itself is kept untouched.
    pub fn abort_content(&mut self, index: usize) -> Result<()> {
        self.card_mut(index)?.status = CardStatus::Idle;
        Ok(())
    }

    pub fn begin_video(&mut self, index: usize) -> Result<()> {
        let card = self.card_mut(index)?;
        if card.generated_script.is_none() {
            return Err(VideoError::SceneError(format!(
                "\"{}\" has no script yet; generate the script before the video",
                card.idea.title
            )));
        }
        card.status = CardStatus::GeneratingVideo {
            progress: crate::prompts::INITIATING_MESSAGE.to_string(),
        };
        Ok(())
    }

    pub fn set_progress(&mut self, index: usize, message: &str) -> Result<()> {
        let card = self.card_mut(index)?;
        if let CardStatus::GeneratingVideo { progress } = &mut card.status {
            *progress = message.to_string();
        }
        Ok(())
    }

    pub fn finish_video(&mut self, index: usize, path: PathBuf) -> Result<()> {
        self.card_mut(index)?.status = CardStatus::VideoReady { path };
        Ok(())
    }

    pub fn abort_video(&mut self, index: usize) -> Result<()> {
        self.card_mut(index)?.status = CardStatus::Idle;
        Ok(())
    }
}
