use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Class name the renderer is always invoked against.
pub const ENTRY_POINT: &str = "GeneratedScene";

/// Marker the prompts ask the model to put between code and narration.
pub const NARRATION_MARKER: &str = "---EXPLANATION_STARTS_HERE---";

/// Minimal scene emitted when no usable script can be recovered, so the
/// renderer never receives an empty file.
pub const FALLBACK_SCRIPT: &str = "from manim import *\n\n\
class GeneratedScene(Scene):\n    \
def construct(self):\n        \
self.add(Text('Error: Scene could not be generated'))\n";

#[derive(Debug, Clone)]
pub struct Extraction {
    pub script: String,
    pub narration: String,
}

/// Splits one free-text model response into a sanitized script and a
/// narration. Never fails; both fields are best-effort strings and either
/// may be degenerate (the script falls back to [`FALLBACK_SCRIPT`], the
/// narration may be empty).
pub fn extract(text: &str) -> Extraction {
    let (script_source, narration) = match text.split_once(NARRATION_MARKER) {
        Some((code, narration)) => (code.to_string(), narration.trim().to_string()),
        None => (text.to_string(), strip_code(text)),
    };

    Extraction {
        script: sanitize_script(&script_source),
        narration,
    }
}

/// Extracts just a script from a repair response, where no narration is
/// expected.
pub fn extract_script(text: &str) -> String {
    sanitize_script(text)
}

fn fence_re() -> Regex {
    Regex::new(r"(?s)```[a-zA-Z]*[ \t]*\r?\n(.*?)```").unwrap()
}

fn declaration_like(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ")
        || t.starts_with("from ")
        || t.starts_with("class ")
        || t.starts_with("def ")
        || t.starts_with('@')
}

/// Best-effort script selection: the first fenced block wins; otherwise
/// collect declaration-looking lines and their indented continuations. A
/// heuristic, not a parser; malformed input can yield incomplete output.
fn select_script_source(text: &str) -> String {
    if let Some(cap) = fence_re().captures(text) {
        return cap[1].to_string();
    }

    debug!("No fenced code block found; falling back to line heuristic");
    text.lines()
        .filter(|line| {
            declaration_like(line)
                || (!line.trim().is_empty() && line.starts_with(|c: char| c == ' ' || c == '\t'))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Coerces model output into a script the renderer can be pointed at:
/// markdown fences removed, the invalid `\c` escape fixed, every class
/// declaration renamed to the fixed entry point, and the `Scene` base forced
/// onto the declaration. The rename is a blind text substitution on the
/// declaration; references to the old name inside the body are left as-is.
fn sanitize_script(source: &str) -> String {
    let mut code = select_script_source(source);

    // Stray fence lines survive when the model opens a fence and never
    // closes it.
    let stray_fence = Regex::new(r"(?m)^```[a-zA-Z]*[ \t]*$").unwrap();
    code = stray_fence.replace_all(&code, "").into_owned();

    code = code.replace(r"\c", r"\\c");

    let class_decl = Regex::new(r"class\s+\w+\s*\(").unwrap();
    code = class_decl
        .replace_all(&code, format!("class {ENTRY_POINT}(").as_str())
        .into_owned();

    // Force the Scene base when the surviving base list lacks one
    // (covers Scene, MovingCameraScene, ThreeDScene, ...).
    let entry_decl = Regex::new(&format!(r"class {ENTRY_POINT}\(([^)]*)\)")).unwrap();
    code = entry_decl
        .replace(&code, |caps: &Captures| {
            if caps[1].contains("Scene") {
                caps[0].to_string()
            } else {
                format!("class {ENTRY_POINT}(Scene)")
            }
        })
        .into_owned();

    let code = code.trim();
    if !code.contains(&format!("class {ENTRY_POINT}")) {
        warn!("No usable scene class in model output; using fallback script");
        return FALLBACK_SCRIPT.to_string();
    }

    format!("{code}\n")
}

/// Narration fallback for the no-marker case: the input with fenced blocks
/// and declaration-looking lines removed and blank runs collapsed.
fn strip_code(text: &str) -> String {
    let without_fences = fence_re().replace_all(text, "");

    let mut out = Vec::new();
    let mut last_blank = false;
    for line in without_fences.lines() {
        if declaration_like(line) {
            continue;
        }
        let blank = line.trim().is_empty();
        if blank && last_blank {
            continue;
        }
        last_blank = blank;
        out.push(line);
    }

    out.join("\n").trim().to_string()
}
