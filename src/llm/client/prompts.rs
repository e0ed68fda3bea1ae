//! Prompt templates.

/// Render the annotation prompt for one article.
///
/// Wraps the operator's instruction and asks for a concise, numeric answer.
pub fn annotation_prompt(instruction: &str, article: &str) -> String {
    format!(
        "This is your system Prompt: {instruction}. Remember to keep your answer concise with relevant numbers. Execute your prompt on this: {article}"
    )
}
