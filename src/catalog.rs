/// Precomputed responses for showcase topics; an exact normalized match
/// bypasses generation and rendering entirely.
pub struct CannedVideo {
    pub file: &'static str,
    pub transcript: &'static str,
    pub title: &'static str,
}

const CANNED: &[(&str, CannedVideo)] = &[(
    "pythagoras theorem",
    CannedVideo {
        file: "pythagoras.mp4",
        transcript: "This video demonstrates Pythagoras Theorem step by step with clear \
                     visuals and aligned elements.",
        title: "Explaining Pythagoras Theorem",
    },
)];

/// Trim, lowercase, collapse inner whitespace.
pub fn normalize_topic(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn lookup(normalized_topic: &str) -> Option<&'static CannedVideo> {
    CANNED
        .iter()
        .find(|(key, _)| *key == normalized_topic)
        .map(|(_, v)| v)
}
