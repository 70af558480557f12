use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::audio;

/// Audio may never outlast the video; the video is never extended or cut.
pub fn clamped_duration(video_seconds: f64, audio_seconds: f64) -> f64 {
    audio_seconds.min(video_seconds)
}

/// Muxes the silent rendered video with the synthesized narration track.
/// The output is clamped to the video's duration, so a narration longer
/// than the video is trimmed and a shorter one simply ends early. Missing
/// input files are an error, not something to paper over.
pub async fn mux(video_path: &str, audio_path: &str, out_path: &str) -> anyhow::Result<()> {
    if !Path::new(video_path).exists() {
        anyhow::bail!("video file missing at mux time: {video_path}");
    }
    if !Path::new(audio_path).exists() {
        anyhow::bail!("audio file missing at mux time: {audio_path}");
    }

    let video_seconds = audio::media_duration_seconds(video_path).await?;
    let audio_seconds = audio::wav_duration_seconds(audio_path)?;
    info!(
        "Muxing {:.2}s video with {:.2}s audio (audio clamped to {:.2}s)",
        video_seconds,
        audio_seconds,
        clamped_duration(video_seconds, audio_seconds)
    );

    let duration = format!("{video_seconds:.3}");
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-i",
            video_path,
            "-i",
            audio_path,
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-t",
            &duration,
            out_path,
        ])
        .status()
        .await?;

    if !status.success() {
        anyhow::bail!("ffmpeg failed to mux {video_path} + {audio_path}");
    }

    info!("Final video written to {}", out_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_longer_than_video_is_trimmed() {
        assert_eq!(clamped_duration(10.0, 15.0), 10.0);
    }

    #[test]
    fn audio_shorter_than_video_is_kept() {
        assert_eq!(clamped_duration(10.0, 7.5), 7.5);
    }

    #[tokio::test]
    async fn missing_inputs_fail_loudly() {
        let err = mux("/nonexistent/v.mp4", "/nonexistent/a.wav", "/tmp/out.mp4")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("video file missing"));
    }
}
