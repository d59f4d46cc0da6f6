use anyhow::Context;
use chrono::Local;
use clap::{ArgAction, Parser};
use quote_shorts::api::QuoteClient;
use quote_shorts::audio;
use quote_shorts::config::Config;
use quote_shorts::error::{PipelineError, Result};
use quote_shorts::quote::{QuoteHistory, QuoteSource};
use quote_shorts::render::background::BackgroundRenderer;
use quote_shorts::render::frame::FrameComposer;
use quote_shorts::render::Rendered;
use quote_shorts::upload::{UploadMetadata, YoutubeUploader};
use quote_shorts::video::VideoGenerator;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "quote-shorts")]
#[command(about = "Horror movie quote video generator", long_about = None)]
struct Args {
    /// Number of quotes to use
    #[arg(long, default_value_t = 9)]
    quotes: usize,

    /// Duration per quote in seconds
    #[arg(long, default_value_t = 10)]
    duration: u32,

    /// Upload to YouTube when done
    #[arg(long)]
    upload: bool,

    /// Use custom audio from the audio directory
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    custom_audio: bool,

    /// Specific audio file to use (place it in the audio directory)
    #[arg(long)]
    audio_file: Option<String>,

    /// OpenAI API key
    #[arg(long)]
    api_key: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let api_key = if let Some(key) = args.api_key.clone() {
        key
    } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        key
    } else {
        eprintln!("Error: OPENAI_API_KEY not found. Set it via --api-key or the OPENAI_API_KEY environment variable");
        std::process::exit(1);
    };

    let config = Config::default();
    config
        .ensure_directories()
        .context("Failed to set up project directories")?;

    info!("Starting horror quote video generation...");

    if let Err(e) = run_pipeline(&config, &args, api_key) {
        error!("Video generation failed: {}", e);
        std::process::exit(1);
    }

    info!("Video generation completed successfully!");
    Ok(())
}

fn run_pipeline(cfg: &Config, args: &Args, api_key: String) -> Result<()> {
    // 1. Quotes, deduplicated against the persisted history.
    let client = QuoteClient::new(api_key);
    let mut history = QuoteHistory::load(&cfg.history_file)?;
    let source = QuoteSource::new(&client, cfg);
    let quotes = source.fetch(args.quotes, &mut history)?;
    if quotes.is_empty() {
        return Err(PipelineError::Quote(
            "No quotes available, nothing to render".to_string(),
        ));
    }

    // 2. One gradient background per quote.
    let renderer = BackgroundRenderer::new(cfg);
    let backgrounds: Vec<Rendered> = (0..quotes.len()).map(|i| renderer.render(i)).collect();

    // 3. One frame per quote, order preserved.
    let composer = FrameComposer::new(cfg);
    let frames: Vec<PathBuf> = backgrounds
        .iter()
        .zip(&quotes)
        .enumerate()
        .map(|(i, (background, quote))| composer.compose(background.path(), quote, i).into_path())
        .collect();

    // 4. Background audio, if any. Advisory: none means a silent video.
    let music = if args.audio_file.is_some() {
        audio::select_audio(cfg, args.audio_file.as_deref())
    } else if args.custom_audio {
        audio::select_audio(cfg, None)
    } else {
        None
    };

    // 5. Assemble. This is the first stage allowed to fail the run.
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let output_path = cfg.output_dir.join(format!("horror_quotes_{}.mp4", timestamp));
    let generator = VideoGenerator::new(cfg);
    let video_path = generator.assemble(&frames, &output_path, music.as_deref(), args.duration)?;

    // 6. Optional upload; the video is already safe on disk either way.
    if args.upload {
        let uploader = YoutubeUploader::new();
        let meta = UploadMetadata {
            title: "Haunting Horror Movie Quotes".to_string(),
            description: "A collection of the most spine-chilling quotes from classic horror films"
                .to_string(),
            tags: ["horror", "movie quotes", "scary", "horror films", "shorts"]
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
        };
        if let Err(e) = uploader.upload(&video_path, &meta) {
            warn!(
                "Your video is still available locally at: {}",
                video_path.display()
            );
            return Err(e);
        }
    }

    info!("Video saved to: {}", video_path.display());
    Ok(())
}
