use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::post;
use axum::{Json, Router};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::args::Args;
use crate::error::ApiError;
use crate::gemini::GeminiClient;
use crate::pipeline::{self, SceneRenderer};
use crate::render::ManimRenderer;
use crate::{catalog, extract, finish, prompt, tts};

/// Everything a request handler needs, injected rather than ambient.
pub struct AppState {
    pub args: Args,
    pub gemini: GeminiClient,
    pub renderer: ManimRenderer,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
    pub transcript: String,
    pub title: String,
}

pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(state.args.allow_origin.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/generate-video", post(generate_video))
        .nest_service("/videos", ServeDir::new(&state.args.videos_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Random per-request identifier; keeps concurrent requests' temp files
/// from colliding in the shared working directory.
pub fn new_request_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

async fn generate_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<VideoResponse>, ApiError> {
    let topic = catalog::normalize_topic(&req.prompt);
    if topic.is_empty() {
        return Err(ApiError::InvalidInput("prompt must not be empty".into()));
    }
    info!("Prompt received: {}", topic);

    if let Some(hit) = catalog::lookup(&topic) {
        info!("Serving canned video for: {}", topic);
        return Ok(Json(VideoResponse {
            video_url: format!("{}/videos/{}", state.args.public_base_url, hit.file),
            transcript: hit.transcript.to_string(),
            title: hit.title.to_string(),
        }));
    }

    let raw = state
        .gemini
        .generate(&prompt::generation_prompt(&topic))
        .await?;

    let extracted = extract::extract(&raw);
    let narration = if extracted.narration.is_empty() {
        format!("Step-by-step explanation for {topic}")
    } else {
        extracted.narration.clone()
    };

    let token = new_request_token();
    let rendered = pipeline::render_with_repair(
        &state.renderer,
        &state.gemini,
        &token,
        extracted.script,
        state.args.max_render_attempts,
    )
    .await?;

    if !rendered.video_path.exists() {
        return Err(ApiError::MissingOutput(rendered.video_path.display().to_string()));
    }

    let audio_path = Path::new(&state.args.work_dir).join(format!("audio_{token}.wav"));
    tts::synthesize(
        &state.args.piper_model,
        &narration,
        state.args.speech_speed,
        &audio_path.to_string_lossy(),
    )
    .await?;

    let final_name = format!("video_{token}.mp4");
    let final_path = Path::new(&state.args.videos_dir).join(&final_name);
    finish::mux(
        &rendered.video_path.to_string_lossy(),
        &audio_path.to_string_lossy(),
        &final_path.to_string_lossy(),
    )
    .await?;

    state.renderer.discard(&token);
    if let Err(e) = std::fs::remove_file(&audio_path) {
        warn!("Failed to remove {}: {}", audio_path.display(), e);
    }

    info!(
        "Request for '{}' finished after {} render attempt(s)",
        topic, rendered.attempts
    );

    Ok(Json(VideoResponse {
        video_url: format!("{}/videos/{}", state.args.public_base_url, final_name),
        transcript: narration,
        title: format!("Explaining {topic}"),
    }))
}
