use std::sync::LazyLock;

use regex::Regex;

/// Lead-in phrases the model puts before the story, e.g.
/// "Here is a 600 word bedtime story:". The gap before "bedtime story" stays
/// within one clause so story text that merely mentions one is kept.
static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:here is a|this is a|here['’]s a)[^.,;!?\n]*?bedtime story:?\s*")
        .expect("lead-in pattern is valid")
});

/// Strips the provider's lead-in phrase and surrounding whitespace.
pub fn sanitize_story(raw: &str) -> String {
    LEAD_IN.replace(raw, "").trim().to_string()
}
