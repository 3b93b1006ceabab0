mod api;
mod config;
mod error;
mod idea;
mod prompts;
mod video;

use anyhow::Context;
use api::{GeminiClient, Thumbnail};
use clap::Parser;
use config::Settings;
use idea::{GeneratedScript, IdeaBoard};
use prompts::Avatar;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use video::VideoPoller;

#[derive(Parser, Debug)]
#[command(name = "viral-views")]
#[command(about = "Turn a channel topic into video ideas, scripts, thumbnails and a narrated video", long_about = None)]
struct Args {
    /// Channel topic, e.g. "Funny talking babies"
    #[arg(short, long, required_unless_present = "file", conflicts_with = "file")]
    topic: Option<String>,

    /// Read the topic from a text file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Which generated idea to produce (1-based)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    idea: u32,

    /// Narration language
    #[arg(short, long, default_value = prompts::DEFAULT_LANGUAGE)]
    language: String,

    /// On-screen narrator: baby, nova, zen, anya (anything else means voice only)
    #[arg(short, long, default_value = "none")]
    avatar: String,

    /// Output video file path
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Working directory for ideas, script and thumbnail
    #[arg(short = 'w', long, default_value = "./output")]
    work_dir: PathBuf,

    /// Stop after listing the generated ideas
    #[arg(long)]
    ideas_only: bool,

    /// Generate script and thumbnail but no video
    #[arg(long)]
    skip_video: bool,

    /// Seconds between video status checks
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Status checks before giving up on the video
    #[arg(long, default_value_t = 90)]
    max_polls: u32,

    /// Gemini API key (falls back to GEMINI_API_KEY / API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Generative Language API endpoint
    #[arg(long, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
}

struct SessionOptions {
    topic: String,
    idea_index: usize,
    language: String,
    avatar: Avatar,
    output: PathBuf,
    ideas_only: bool,
    skip_video: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // API key: flag, then environment
    let api_key = match config::resolve_api_key(args.api_key.clone(), |k| std::env::var(k).ok()) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Topic from flag or file
    let topic = match (&args.topic, &args.file) {
        (Some(topic), _) => topic.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read topic file: {}", path.display()))?,
        (None, None) => unreachable!("clap requires --topic or --file"),
    };

    // Artifacts land in the work dir
    tokio::fs::create_dir_all(&args.work_dir)
        .await
        .context("Failed to create work directory")?;

    if !prompts::LANGUAGES.contains(&args.language.as_str()) {
        warn!(
            "Language {} is not one of {:?}; passing it through to the model",
            args.language,
            prompts::LANGUAGES
        );
    }

    let settings = Settings::new(api_key)
        .with_base_url(&args.base_url)
        .with_work_dir(&args.work_dir)
        .with_poll_interval(Duration::from_secs(args.poll_interval))
        .with_max_polls(args.max_polls);

    let options = SessionOptions {
        topic,
        idea_index: (args.idea - 1) as usize,
        language: args.language.clone(),
        avatar: args.avatar.parse().unwrap_or_default(),
        output: args.output.clone(),
        ideas_only: args.ideas_only,
        skip_video: args.skip_video,
    };

    if let Err(e) = run_session(settings, options).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_session(settings: Settings, options: SessionOptions) -> anyhow::Result<()> {
    let client = GeminiClient::new(settings.clone())?;
    let work_dir = settings.work_dir.as_path();

    // 1. Ideas
    info!("Step 1/3: Generating video concepts...");
    let response = client
        .generate_ideas(&options.topic)
        .await
        .context("An error occurred while generating ideas. Please try again")?;
    let mut board = IdeaBoard::from_response(response)?;

    let ideas_path = work_dir.join("ideas.json");
    tokio::fs::write(&ideas_path, serde_json::to_string_pretty(&board.ideas())?).await?;
    for (i, card) in board.cards().iter().enumerate() {
        let idea = &card.idea;
        info!("Idea {}: {}", i + 1, idea.title);
        info!("  Hook: {}", idea.hook);
        info!("  Target audience: {}", idea.target_audience);
        info!("  Thumbnail idea: {}", idea.thumbnail_suggestion);
    }
    info!("Saved {} ideas to {}", board.len(), ideas_path.display());

    if options.ideas_only {
        return Ok(());
    }

    // 2. Script and thumbnail for the chosen idea
    let index = options.idea_index;
    let title = board.card(index)?.idea.title.clone();

    info!("Step 2/3: Creating script & thumbnail for \"{}\"...", title);
    generate_content(&client, &mut board, index, work_dir)
        .await
        .with_context(|| format!("Failed to generate content for \"{}\"", title))?;

    // 3. Video
    if options.skip_video {
        info!("Skipping video generation");
    } else {
        info!("Step 3/3: Generating video for \"{}\"...", title);
        generate_video(&client, &mut board, index, &options)
            .await
            .with_context(|| format!("Failed to generate video for \"{}\"", title))?;
    }

    let card = board.card(index)?;
    info!(
        "Done with \"{}\" (script & thumbnail: {}, video: {})",
        title,
        if card.has_generated_content() { "yes" } else { "no" },
        card.video_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}

/// Script and thumbnail are independent, so both requests run at once.
async fn generate_content(
    client: &GeminiClient,
    board: &mut IdeaBoard,
    index: usize,
    work_dir: &Path,
) -> error::Result<()> {
    let idea = board.begin_content(index)?.clone();

    let result = tokio::try_join!(
        client.generate_script(&idea),
        client.generate_thumbnail(&idea.thumbnail_suggestion),
    );

    let saved = match result {
        Ok((script, thumbnail)) => save_content(work_dir, &script, &thumbnail)
            .await
            .map(|()| (script, thumbnail)),
        Err(e) => Err(e),
    };

    match saved {
        Ok((script, thumbnail)) => board.finish_content(index, script, thumbnail.bytes),
        Err(e) => {
            board.abort_content(index)?;
            Err(e)
        }
    }
}

async fn save_content(
    work_dir: &Path,
    script: &GeneratedScript,
    thumbnail: &Thumbnail,
) -> error::Result<()> {
    let script_json = work_dir.join("script.json");
    tokio::fs::write(&script_json, serde_json::to_string_pretty(script)?).await?;

    let script_text = work_dir.join("script.txt");
    tokio::fs::write(&script_text, script.to_clipboard_text()).await?;

    // The request pins image/jpeg
    let thumbnail_path = work_dir.join("thumbnail.jpg");
    tokio::fs::write(&thumbnail_path, &thumbnail.bytes).await?;
    if thumbnail.mime_type != "image/jpeg" {
        warn!("Thumbnail came back as {}, saved as .jpg", thumbnail.mime_type);
    }

    info!("Script: {}", script.title);
    for scene in &script.script {
        info!("  Scene {} visual: {}", scene.scene, scene.visual_description);
        info!("  Scene {} voiceover: {}", scene.scene, scene.voiceover);
    }
    info!(
        "Saved {}, {} and {}",
        script_json.display(),
        script_text.display(),
        thumbnail_path.display()
    );
    Ok(())
}

async fn generate_video(
    client: &GeminiClient,
    board: &mut IdeaBoard,
    index: usize,
    options: &SessionOptions,
) -> error::Result<PathBuf> {
    board.begin_video(index)?;

    let card = board.card(index)?;
    let idea = card.idea.clone();
    let script = card
        .generated_script
        .clone()
        .ok_or_else(|| error::VideoError::SceneError("Script missing".to_string()))?;

    let result = VideoPoller::new(client)
        .produce(
            &idea,
            &script,
            &options.language,
            options.avatar,
            &options.output,
            |message| {
                if let Err(e) = board.set_progress(index, message) {
                    warn!("Could not record progress: {}", e);
                }
            },
        )
        .await;

    match result {
        Ok(path) => {
            board.finish_video(index, path.clone())?;
            Ok(path)
        }
        Err(e) => {
            if let Some(last) = board.card(index)?.progress() {
                warn!("Video generation stopped at: {}", last);
            }
            board.abort_video(index)?;
            Err(e)
        }
    }
}
