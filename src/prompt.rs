use crate::extract::{ENTRY_POINT, NARRATION_MARKER};

/// Curated prompts for topics where the generic template produces weak
/// animations. Matched by substring against the normalized topic.
const TOPIC_PROMPTS: &[(&str, &str)] = &[
    (
        "pythagoras",
        "Create a Manim Community Edition script (Python) that visually explains the \
         Pythagorean Theorem. Ensure the triangle is right-angled, sides a^2 + b^2 = c^2 \
         are highlighted, and include verification with area squares. Follow these phases: \
         intro with title, construct triangle and squares, show the relationship \
         step-by-step, verify and conclude.",
    ),
    (
        "system of equations",
        "Create a Manim Community Edition script (Python) that demonstrates solving a \
         System of Linear Equations graphically. Plot two equations with different slopes, \
         show the intersection point, and narrate the steps clearly. Animation flow: title \
         and introduction, plot lines from equations, highlight the intersection point, \
         explain the meaning visually.",
    ),
];

fn common_rules() -> String {
    format!(
        "Hard requirements:\n\
         - Manim Community Edition syntax only; never ManimGL or deprecated APIs.\n\
         - Import everything you use; `from manim import *` plus `numpy` if needed.\n\
         - One scene class named `{entry}` inheriting from `Scene`.\n\
         - Built-in shapes and colors only; keep every object inside the safe zone \
           (|x| <= 5.5, |y| <= 2.8) and avoid overlapping text.\n\
         - Add self.wait() pacing between steps and self.wait(3) at the end.\n\n\
         Output format: the Python code first, with no surrounding commentary, then the \
         exact line `{marker}` followed by a spoken-word narration of the animation.",
        entry = ENTRY_POINT,
        marker = NARRATION_MARKER,
    )
}

/// Prompt for the initial generation of script plus narration.
pub fn generation_prompt(topic: &str) -> String {
    let brief = TOPIC_PROMPTS
        .iter()
        .find(|(key, _)| topic.contains(key))
        .map(|(_, p)| (*p).to_string())
        .unwrap_or_else(|| {
            format!(
                "You are an expert Manim Community animator. Generate a zero-error \
                 animation script that visually explains the following math topic step by \
                 step, with text explanations, dynamic equation transformations, relevant \
                 geometric or graphical representations, and smooth transitions \
                 (FadeIn, Transform, Create).\n\nTopic: {topic}"
            )
        });

    format!("{brief}\n\n{}", common_rules())
}

/// Prompt asking the model to repair a script that failed to render. The
/// renderer's captured output is passed through verbatim.
pub fn repair_prompt(script: &str, diagnostic: &str) -> String {
    format!(
        "The following Manim Community Edition script failed to render. Fix it so it \
         renders without errors, changing as little as possible.\n\n\
         Script:\n```python\n{script}\n```\n\n\
         Renderer output:\n{diagnostic}\n\n\
         Respond with the corrected Python code only, in a single fenced code block, \
         keeping the scene class named `{entry}` inheriting from `Scene`. Do not include \
         any narration or commentary.",
        entry = ENTRY_POINT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_bank_matches_by_substring() {
        let p = generation_prompt("prove pythagoras theorem visually");
        assert!(p.contains("Pythagorean Theorem"));
        assert!(p.contains(NARRATION_MARKER));
    }

    #[test]
    fn unknown_topic_uses_default_template() {
        let p = generation_prompt("matrix determinants");
        assert!(p.contains("matrix determinants"));
        assert!(p.contains(ENTRY_POINT));
    }

    #[test]
    fn repair_prompt_carries_diagnostic_verbatim() {
        let p = repair_prompt("class X(Scene): pass", "NameError: name 'Circl' is not defined");
        assert!(p.contains("NameError: name 'Circl' is not defined"));
    }
}
