use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tracing::{info, warn};

use crate::extract::ENTRY_POINT;
use crate::pipeline::{AttemptOutcome, SceneRenderer};

/// Invokes the external `manim` CLI against a per-request script file.
#[derive(Clone)]
pub struct ManimRenderer {
    work_dir: PathBuf,
    timeout: Duration,
}

impl ManimRenderer {
    pub fn new(work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { work_dir: work_dir.into(), timeout }
    }

    fn script_name(token: &str) -> String {
        format!("video_{token}.py")
    }

    pub fn script_path(&self, token: &str) -> PathBuf {
        self.work_dir.join(Self::script_name(token))
    }

    /// Where manim puts the rendered scene for `-ql`, derived from the
    /// script file stem.
    pub fn output_path(&self, token: &str) -> PathBuf {
        self.work_dir
            .join("media")
            .join("videos")
            .join(format!("video_{token}"))
            .join("480p15")
            .join(format!("{ENTRY_POINT}.mp4"))
    }

    fn media_dir(&self, token: &str) -> PathBuf {
        self.work_dir
            .join("media")
            .join("videos")
            .join(format!("video_{token}"))
    }

    async fn invoke(&self, token: &str, script: &str) -> anyhow::Result<AttemptOutcome> {
        let script_path = self.script_path(token);
        tokio::fs::write(&script_path, script)
            .await
            .with_context(|| format!("failed to write script {}", script_path.display()))?;

        info!("Rendering {} with manim", script_path.display());

        let run = Command::new("manim")
            .current_dir(&self.work_dir)
            .args(["-ql", &Self::script_name(token), ENTRY_POINT])
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(output) => output.context("failed to spawn manim")?,
            Err(_) => {
                warn!("manim timed out after {:?}", self.timeout);
                return Ok(AttemptOutcome::Failure(format!(
                    "renderer timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        let mut diagnostic = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostic.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Ok(AttemptOutcome::Failure(diagnostic));
        }

        // Exit zero alone is not proof of output; the file must be there.
        let video = self.output_path(token);
        if !video.exists() {
            return Ok(AttemptOutcome::Failure(format!(
                "renderer exited 0 but expected output {} is missing\n{diagnostic}",
                video.display()
            )));
        }

        Ok(AttemptOutcome::Success(video))
    }

    fn remove_artifacts(&self, token: &str) {
        remove_quiet(&self.script_path(token));
        let media = self.media_dir(token);
        if media.exists() {
            if let Err(e) = std::fs::remove_dir_all(&media) {
                warn!("Failed to remove {}: {}", media.display(), e);
            }
        }
    }
}

fn remove_quiet(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

impl SceneRenderer for ManimRenderer {
    async fn render(&self, token: &str, script: &str, attempt: u32) -> anyhow::Result<AttemptOutcome> {
        info!("Render attempt {} for token {}", attempt, token);
        self.invoke(token, script).await
    }

    fn discard(&self, token: &str) {
        self.remove_artifacts(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_is_derived_from_script_stem() {
        let r = ManimRenderer::new("/tmp/work", Duration::from_secs(1));
        assert_eq!(
            r.output_path("abc123"),
            PathBuf::from("/tmp/work/media/videos/video_abc123/480p15/GeneratedScene.mp4")
        );
        assert_eq!(r.script_path("abc123"), PathBuf::from("/tmp/work/video_abc123.py"));
    }
}
