use crate::idea::{GeneratedScript, VideoIdea};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const IDEAS_SYSTEM_INSTRUCTION: &str = "You are 'Viral Views AI', a world-class YouTube content strategist and creative director. Your goal is to generate highly engaging, viral video ideas that can attract millions of subscribers. For any given topic, you must provide a comprehensive content plan. Be creative, specific, and focus on what makes content shareable and watchable. Adhere strictly to the provided JSON schema.";

pub const SCRIPT_SYSTEM_INSTRUCTION: &str = "You are a professional screenwriter specializing in creating ultra-short, viral video clips. Your task is to turn a video concept into a production-ready script for a single scene, lasting about 8-10 seconds. Follow the JSON schema precisely, ensuring the script array contains only one item.";

pub const INITIATING_MESSAGE: &str = "Initiating video generation...";
pub const DOWNLOADING_MESSAGE: &str = "Downloading final video...";

/// Shown round-robin while the video operation is still running.
pub const PROGRESS_MESSAGES: [&str; 8] = [
    "Warming up the virtual cameras...",
    "Casting our AI actors...",
    "Teaching the AI to talk...",
    "Syncing dialogue and lip movements...",
    "Rendering the first scenes with voice...",
    "Compositing visual effects and audio...",
    "Adding the final polish to the animation...",
    "Almost there, preparing for premiere...",
];

pub fn progress_message(poll: usize) -> &'static str {
    PROGRESS_MESSAGES[poll % PROGRESS_MESSAGES.len()]
}

/// Languages offered for narration. Any other value is passed through as-is.
pub const LANGUAGES: [&str; 2] = ["English", "Telugu"];
pub const DEFAULT_LANGUAGE: &str = "English";

/// On-screen narrator for the generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Avatar {
    Baby,
    Nova,
    Zen,
    Anya,
    #[default]
    VoiceOnly,
}

impl Avatar {
    pub fn id(self) -> &'static str {
        match self {
            Avatar::Baby => "baby",
            Avatar::Nova => "nova",
            Avatar::Zen => "zen",
            Avatar::Anya => "anya",
            Avatar::VoiceOnly => "none",
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Avatar::Baby => concat!(
                "**Primary Character:** The narrator and on-screen character is an adorable, expressive, and hyper-realistic animated baby, modeled after a child with big, curious eyes and a happy smile.\n",
                "      **Voice:** Use a cute, AI-generated baby-like voice that is still clear and easy to understand in the specified language. The voice must match the script's content and be perfectly lip-synced.\n",
                "      **Animation:** The baby's animations should be lifelike and engaging, with natural expressions (giggles, wide eyes, etc.) and movements that fit the voiceover."
            ),
            Avatar::Nova => concat!(
                "**Primary Character:** The narrator and on-screen character is 'Nova', a professional and trustworthy news anchor in her early 30s.\n",
                "      **Appearance:** She should have a polished, professional look (e.g., a smart blazer), suitable for a major news network.\n",
                "      **Voice:** Use a clear, articulate, and authoritative female voice in the specified language. The tone should be confident and engaging.\n",
                "      **Animation:** Animations should be subtle and professional, with realistic facial expressions and hand gestures appropriate for a news broadcast."
            ),
            Avatar::Zen => concat!(
                "**Primary Character:** The narrator and on-screen character is 'Zen', a friendly and calm cartoon guide.\n",
                "      **Appearance:** A simple, 2D animated character with a warm and approachable design. Think modern educational cartoon style.\n",
                "      **Voice:** Use a gentle, soothing, and friendly male or female voice in the specified language.\n",
                "      **Animation:** Animation should be smooth and expressive in a 2D cartoon style, with clear gestures that help explain the concepts in the voiceover."
            ),
            Avatar::Anya => concat!(
                "**Primary Character:** The narrator and on-screen character is 'Dr. Anya', a brilliant and approachable scientist in her 40s.\n",
                "      **Appearance:** She should look like an expert in her field, perhaps in a lab coat or professional attire, with a realistic and detailed character model.\n",
                "      **Voice:** Use an intelligent, clear, and enthusiastic female voice in the specified language, conveying expertise without being condescending.\n",
                "      **Animation:** Animations should be realistic and expressive, showing passion for the subject. She should interact with virtual graphics or elements related to the script."
            ),
            Avatar::VoiceOnly => "**Voice Only:** This video should primarily be a voiceover with animated visuals as described in the script. No specific on-screen narrator is required.",
        }
    }
}

impl FromStr for Avatar {
    type Err = std::convert::Infallible;

    /// Unknown ids fall back to a voice-only video.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "baby" => Avatar::Baby,
            "nova" => Avatar::Nova,
            "zen" => Avatar::Zen,
            "anya" => Avatar::Anya,
            _ => Avatar::VoiceOnly,
        })
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

pub fn ideas_prompt(topic: &str) -> String {
    format!("Generate 3 viral YouTube video ideas for the topic: \"{}\"", topic.trim())
}

pub fn ideas_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "videoIdeas": {
                "type": "ARRAY",
                "description": "A list of 3 unique and compelling video ideas.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "A catchy, SEO-friendly, and highly clickable video title (under 70 characters)."
                        },
                        "hook": {
                            "type": "STRING",
                            "description": "A powerful opening sentence (the first 10-15 seconds) to grab the viewer's attention immediately and prevent them from skipping."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A brief, engaging video description for YouTube, optimized with relevant keywords to improve search visibility."
                        },
                        "scriptOutline": {
                            "type": "ARRAY",
                            "description": "A bulleted list of 5-7 key talking points or scenes for the video script, structured for maximum viewer retention.",
                            "items": { "type": "STRING" }
                        },
                        "targetAudience": {
                            "type": "STRING",
                            "description": "A specific description of the ideal viewer for this video, including their interests and pain points."
                        },
                        "thumbnailSuggestion": {
                            "type": "STRING",
                            "description": "A vivid, detailed description of a high-click-through-rate (CTR) thumbnail image. Focus on emotion, clarity, and visual intrigue."
                        }
                    },
                    "required": ["title", "hook", "description", "scriptOutline", "targetAudience", "thumbnailSuggestion"]
                }
            }
        },
        "required": ["videoIdeas"]
    })
}

pub fn script_prompt(idea: &VideoIdea) -> String {
    format!(
        r#"Your task is to create a script for a single, concise, and engaging video clip, approximately 8-10 seconds long.
The script must focus on a single situation or moment, not a full story.

Based on the video idea:
Title: "{title}"
Hook: "{hook}"

Generate a script that contains ONLY ONE SCENE. This scene should describe one of the following:
1. A character delivering a single, impactful line of dialogue.
2. A character performing a single, clear, and visually interesting action.
3. A very short voiceover (1-2 sentences) explaining a single, focused visual.

The goal is to create content that is focused and perfectly sized for an 8-10 second video.
- **Visual Description:** Must be vivid and clear for an animator, describing only what happens in this single scene.
- **Voiceover:** Must be extremely brief and directly related to the visual.

Return the original title in your response, and ensure the 'script' array in the JSON contains exactly one scene object."#,
        title = idea.title,
        hook = idea.hook,
    )
}

pub fn script_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "The original video title." },
            "script": {
                "type": "ARRAY",
                "description": "A list of scenes for the video. For this task, it must contain exactly one scene.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "scene": { "type": "NUMBER", "description": "Scene number, which should always be 1." },
                        "visualDescription": { "type": "STRING", "description": "A detailed description of the visuals for this single scene." },
                        "voiceover": { "type": "STRING", "description": "The exact, concise voiceover or dialogue for this scene." }
                    },
                    "required": ["scene", "visualDescription", "voiceover"]
                }
            }
        },
        "required": ["title", "script"]
    })
}

pub fn thumbnail_prompt(suggestion: &str) -> String {
    format!(
        "Create a high-impact, high-click-through-rate YouTube thumbnail based on this description: \"{}\". \
         The thumbnail should be visually stunning, emotionally resonant, and have clear, bold elements. \
         Avoid putting any text on the image itself. The aspect ratio must be 16:9.",
        suggestion
    )
}

/// Scene-by-scene block embedded at the end of the director prompt.
pub fn script_block(script: &GeneratedScript) -> String {
    script
        .script
        .iter()
        .map(|s| {
            format!(
                "\n      ---\n      **Scene:** {}\n      **Visuals:** {}\n      **Voiceover:** \"{}\"\n      ---\n",
                s.scene, s.visual_description, s.voiceover
            )
        })
        .collect()
}

pub fn video_prompt(
    idea: &VideoIdea,
    script: &GeneratedScript,
    language: &str,
    avatar: Avatar,
) -> String {
    format!(
        r#"**AI Director Final Execution Order**

**1. PRIMARY OBJECTIVE: Full Audio & Lip-Sync**
   - **VOICEOVER:** Generate a complete, high-quality voiceover in **{language}**. The voice must match the **{avatar}** character profile.
   - **DIALOGUE:** The voiceover must narrate the *entire* script's "Voiceover" text, from the first scene to the last.
   - **LIP-SYNC:** The on-screen character's lip movements MUST be perfectly synchronized with the dialogue.
   - **FAILURE CONDITION:** A video that is silent, has missing audio, or poor lip-sync is an IMMEDIATE failure.

**2. CHARACTER & AVATAR DIRECTIVE**
   {directive}

**3. CINEMATIC & VISUALS DIRECTIVE**
   - **QUALITY:** Photorealistic, cinematic quality. Aim for the visual fidelity of an Unreal Engine 5 render.
   - **LIGHTING:** Use dramatic, cinematic lighting with soft shadows and ray-traced reflections.
   - **CAMERA:** Employ dynamic camera work (e.g., subtle pans, dolly shots, focus pulls) to create a professional feel.
   - **RESOLUTION:** 1080p (1920x1080), 16:9 aspect ratio.

**4. DO NOT INCLUDE (Negative Prompt)**
   - Muted/silent output.
   - Robotic or unnatural character animation.
   - Static, boring camera shots.
   - Glitches, artifacts, or visual noise.
   - Truncated or incomplete videos that do not cover the full script.

**5. SCRIPT FOR PRODUCTION (Scene by Scene)**
   **Title:** "{title}"
{scenes}
**--- SCRIPT END ---**

Execute this directive with precision. The final output must be a polished, professional video ready for publication that fully renders the entire script provided."#,
        language = language,
        avatar = avatar,
        directive = avatar.directive(),
        title = idea.title,
        scenes = script_block(script),
    )
}
