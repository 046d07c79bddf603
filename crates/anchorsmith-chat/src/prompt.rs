//! Anchor prompt construction.

use anchorsmith_core::GenerationSettings;

/// Few-shot examples for the keyword "darts".
const EXAMPLES: &[&str] = &["play darts online", "online darts", "bet on darts", "darts on Stake"];

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the anchor-suggestion prompt for a seed keyword and source text.
///
/// With no seed, the model is asked to pick the topic from the text.
pub fn build_prompt(settings: &GenerationSettings, seed: Option<&str>, text: &str) -> String {
    let text = truncate_chars(text.trim(), settings.prefix_chars);
    let generic = settings
        .blocklist
        .iter()
        .take(3)
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");
    let examples = EXAMPLES
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "You are an SEO anchor text expert. Generate a list of {count} natural, concise \
         anchor texts ({min} to {max} words max) for an internal link.\n\
         Each anchor must contain the main keyword or a close variation of it.\n\
         Avoid article titles, long phrases, full sentences, or generic terms like {generic}.\n\
         Examples for the keyword \"darts\": {examples}.\n\
         Output the results as a JSON array of strings ONLY.\n",
        count = settings.target_count,
        min = settings.min_words,
        max = settings.max_words,
        generic = generic,
        examples = examples,
    );

    match seed {
        Some(seed) => prompt.push_str(&format!("Main keyword/topic: \"{}\"\n", seed)),
        None => prompt.push_str("Main keyword/topic: infer it from the content below.\n"),
    }
    if !text.is_empty() {
        prompt.push_str("\nContent:\n");
        prompt.push_str(text);
        prompt.push('\n');
    }
    prompt
}
