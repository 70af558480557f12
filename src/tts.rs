use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info};

/// Synthesizes narration to a WAV file with piper. `speed` is a playback
/// multiplier; piper takes the inverse as a length scale.
pub async fn synthesize(model: &str, text: &str, speed: f64, out_path: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("narration is empty, cannot generate audio");
    }

    let length_scale = format!("{:.3}", 1.0 / speed);
    info!("Calling piper for {} ({} chars, speed {})", out_path, text.len(), speed);

    let mut child = Command::new("piper")
        .args([
            "--model",
            model,
            "--output_file",
            out_path,
            "--length_scale",
            &length_scale,
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()
        .context("failed to spawn piper")?;

    {
        let stdin = child.stdin.as_mut().context("failed to open piper stdin")?;
        stdin.write_all(text.as_bytes()).await?;
    }
    drop(child.stdin.take());

    let status = child.wait().await?;
    if !status.success() {
        error!("Piper TTS command failed for {}", out_path);
        anyhow::bail!("TTS engine failed, command returned non-zero");
    }
    Ok(())
}
