mod args;
mod audio;
mod catalog;
mod error;
mod extract;
mod finish;
mod gemini;
mod pipeline;
mod prompt;
mod render;
mod server;
mod tts;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use crate::args::Args;
use crate::gemini::GeminiClient;
use crate::render::ManimRenderer;
use crate::server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Starting math animation video backend");

    let args = Args::parse();

    let api_key = match args.api_key.clone().or_else(|| std::env::var("GEMINI_API_KEY").ok()) {
        Some(key) if !key.is_empty() => key,
        _ => {
            error!("No Gemini API key; set --api-key or GEMINI_API_KEY");
            std::process::exit(1);
        }
    };

    if !Path::new(&args.piper_model).exists() {
        error!("Piper voice model not found: {}", args.piper_model);
        std::process::exit(1);
    }

    std::fs::create_dir_all(&args.videos_dir)?;
    std::fs::create_dir_all(&args.work_dir)?;
    info!(
        "Serving videos from '{}', scratch files in '{}'",
        args.videos_dir, args.work_dir
    );

    let gemini = GeminiClient::new(
        api_key,
        args.model.clone(),
        Duration::from_secs(args.generate_timeout_secs),
    )?;
    let renderer = ManimRenderer::new(
        args.work_dir.clone(),
        Duration::from_secs(args.render_timeout_secs),
    );

    let addr = format!("{}:{}", args.host, args.port);
    let state = Arc::new(AppState { args, gemini, renderer });
    let app = server::router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
