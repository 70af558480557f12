use std::future::Future;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::ApiError;
use crate::extract;

/// Result of a single render invocation. A clean exit with a missing output
/// file is reported as `Failure`, not success.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(PathBuf),
    Failure(String),
}

/// Seam over the external renderer so the repair loop is testable.
pub trait SceneRenderer {
    fn render(
        &self,
        token: &str,
        script: &str,
        attempt: u32,
    ) -> impl Future<Output = anyhow::Result<AttemptOutcome>> + Send;

    /// Removes the attempt's on-disk artifacts (script file, media tree).
    fn discard(&self, token: &str);
}

/// Seam over the generative model's script-repair call. Returns the raw
/// model response; the caller re-runs the extractor on it.
pub trait ScriptFixer {
    fn fix(
        &self,
        script: &str,
        diagnostic: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

#[derive(Debug)]
pub struct Rendered {
    pub video_path: PathBuf,
    pub attempts: u32,
}

/// Render-and-repair loop: render the script, and on failure feed the
/// script plus the renderer's verbatim diagnostic back to the model for a
/// fix, up to `max_attempts` render invocations. Stops on first success;
/// exhaustion is a hard failure and no partial result is returned.
pub async fn render_with_repair<R, F>(
    renderer: &R,
    fixer: &F,
    token: &str,
    script: String,
    max_attempts: u32,
) -> Result<Rendered, ApiError>
where
    R: SceneRenderer,
    F: ScriptFixer,
{
    let mut script = script;

    for attempt in 1..=max_attempts {
        info!("Render attempt {}/{}", attempt, max_attempts);

        match renderer.render(token, &script, attempt).await? {
            AttemptOutcome::Success(video_path) => {
                info!("Render succeeded on attempt {}", attempt);
                return Ok(Rendered { video_path, attempts: attempt });
            }
            AttemptOutcome::Failure(diagnostic) => {
                warn!(
                    "Render attempt {} failed ({} bytes of diagnostics)",
                    attempt,
                    diagnostic.len()
                );
                renderer.discard(token);

                if attempt == max_attempts {
                    return Err(ApiError::RenderExhausted {
                        attempts: max_attempts,
                        detail: tail(&diagnostic, 2000),
                    });
                }

                info!("Asking the model to repair the script");
                let response = fixer.fix(&script, &diagnostic).await?;
                script = extract::extract_script(&response);
            }
        }
    }

    Err(ApiError::RenderExhausted {
        attempts: max_attempts,
        detail: "no render attempts configured".to_string(),
    })
}

/// Last `limit` bytes of a diagnostic, on a char boundary; renderer output
/// ends with the actual error, which is the useful part.
fn tail(s: &str, limit: usize) -> String {
    let s = s.trim();
    if s.len() <= limit {
        return s.to_string();
    }
    let mut start = s.len() - limit;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeRenderer {
        outcomes: Mutex<VecDeque<AttemptOutcome>>,
        scripts: Mutex<Vec<String>>,
        calls: AtomicU32,
        discards: AtomicU32,
    }

    impl FakeRenderer {
        fn new(outcomes: Vec<AttemptOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                scripts: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
                discards: AtomicU32::new(0),
            }
        }
    }

    impl SceneRenderer for FakeRenderer {
        async fn render(&self, _token: &str, script: &str, _attempt: u32) -> anyhow::Result<AttemptOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.scripts.lock().unwrap().push(script.to_string());
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("more render calls than scripted outcomes"))
        }

        fn discard(&self, _token: &str) {
            self.discards.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeFixer {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl FakeFixer {
        fn new() -> Self {
            Self { seen: Mutex::new(Vec::new()) }
        }
    }

    impl ScriptFixer for FakeFixer {
        async fn fix(&self, script: &str, diagnostic: &str) -> anyhow::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((script.to_string(), diagnostic.to_string()));
            Ok("```python\nclass Fixed(Scene):\n    def construct(self):\n        pass\n```".into())
        }
    }

    fn ok(path: &str) -> AttemptOutcome {
        AttemptOutcome::Success(PathBuf::from(path))
    }

    fn fail(diag: &str) -> AttemptOutcome {
        AttemptOutcome::Failure(diag.to_string())
    }

    #[tokio::test]
    async fn first_success_renders_exactly_once() {
        let renderer = FakeRenderer::new(vec![ok("a.mp4")]);
        let fixer = FakeFixer::new();

        let rendered = render_with_repair(&renderer, &fixer, "t", "s".into(), 3)
            .await
            .unwrap();

        assert_eq!(rendered.attempts, 1);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(fixer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_on_second_attempt_stops_there() {
        let renderer = FakeRenderer::new(vec![fail("SyntaxError: bad"), ok("a.mp4")]);
        let fixer = FakeFixer::new();

        let rendered = render_with_repair(&renderer, &fixer, "t", "s".into(), 3)
            .await
            .unwrap();

        assert_eq!(rendered.attempts, 2);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.discards.load(Ordering::SeqCst), 1);

        // The repair call receives the failed script and its diagnostic verbatim.
        let seen = fixer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("s".to_string(), "SyntaxError: bad".to_string()));
    }

    #[tokio::test]
    async fn exhaustion_after_three_failures() {
        let renderer = FakeRenderer::new(vec![fail("e1"), fail("e2"), fail("e3")]);
        let fixer = FakeFixer::new();

        let err = render_with_repair(&renderer, &fixer, "t", "s".into(), 3)
            .await
            .unwrap_err();

        match err {
            ApiError::RenderExhausted { attempts, detail } => {
                assert_eq!(attempts, 3);
                assert_eq!(detail, "e3");
            }
            other => panic!("expected RenderExhausted, got {other:?}"),
        }
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
        // Two repairs only; the last failure is terminal.
        assert_eq!(fixer.seen.lock().unwrap().len(), 2);
        // Each repair saw the diagnostic of the attempt just before it.
        let seen = fixer.seen.lock().unwrap();
        assert_eq!(seen[0].1, "e1");
        assert_eq!(seen[1].1, "e2");
    }

    #[tokio::test]
    async fn repaired_script_is_re_extracted() {
        let renderer = FakeRenderer::new(vec![fail("e"), ok("a.mp4")]);
        let fixer = FakeFixer::new();

        render_with_repair(&renderer, &fixer, "t", "broken".into(), 3)
            .await
            .unwrap();

        // The second render receives the sanitized fixed script: the fake's
        // fenced response is re-extracted, renaming `Fixed` on the way.
        let scripts = renderer.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0], "broken");
        assert!(scripts[1].contains("class GeneratedScene(Scene):"));
        assert!(!scripts[1].contains("```"));
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 10), "ab");
    }
}
