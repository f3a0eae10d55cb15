//! Prompt assembly for the summarizer.

use std::borrow::Cow;

/// System message sent with every summary request.
pub const SYSTEM_PROMPT: &str = "You assist with GitHub PR reviews.";

/// PR texts longer than this many characters are cut.
pub const MAX_PR_CHARS: usize = 7000;

pub const TRUNCATION_MARKER: &str = "... (truncated)";

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Keeps the first [`MAX_PR_CHARS`] characters and appends the marker.
pub fn truncate_pr_text(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_PR_CHARS) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
    }
}

/// Builds the user message from the PR text and similar past PR texts.
pub fn build_prompt(pr_text: &str, contexts: &[String]) -> String {
    let pr_text = truncate_pr_text(pr_text);
    let context_text = contexts.join(CONTEXT_SEPARATOR);
    format!(
        "\nYou are a GitHub bot. Summarize the PR below and suggest appropriate labels.\n\
         Context from similar past PRs:\n{context_text}\n---\nNew PR:\n{pr_text}\n"
    )
}
