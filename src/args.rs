use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    #[clap(long, default_value_t = 8000)]
    pub port: u16,

    /// Origin the CORS layer allows; the frontend dev server by default.
    #[clap(long, default_value = "http://localhost:3000")]
    pub allow_origin: String,

    /// Base URL prefixed to returned video paths.
    #[clap(long, default_value = "http://localhost:8000")]
    pub public_base_url: String,

    /// Directory served under /videos for finished files.
    #[clap(long, default_value = "./videos")]
    pub videos_dir: String,

    /// Scratch directory for per-request scripts and intermediate media.
    #[clap(long, default_value = "./work")]
    pub work_dir: String,

    /// Gemini API key; falls back to the GEMINI_API_KEY environment variable.
    #[clap(long)]
    pub api_key: Option<String>,

    #[clap(long, default_value = "gemini-2.5-pro")]
    pub model: String,

    #[clap(long, default_value = "./tts/en_US-hfc_male-medium.onnx")]
    pub piper_model: String,

    #[clap(long, default_value_t = 3)]
    pub max_render_attempts: u32,

    #[clap(long, default_value_t = 1.2)]
    pub speech_speed: f64,

    #[clap(long, default_value_t = 120)]
    pub generate_timeout_secs: u64,

    #[clap(long, default_value_t = 300)]
    pub render_timeout_secs: u64,
}
