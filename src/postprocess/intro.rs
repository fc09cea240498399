//! Intro sections and custom descriptions generated from the finished docs.

use tracing::{debug, info};

use crate::errors::ModelError;
use crate::model::{LanguageModel, Message};
use crate::prompts::{
    CUSTOM_ANALYST_PROMPT, CUSTOM_REWRITE_ANALYST_PROMPT, INTRO_TEXT_PROMPT, LINKS_INTRO_PROMPT,
    NO_INFO_MARKER, NO_INFO_PHRASE, build_language_prompt, custom_description_rules,
    custom_rewrite_rules,
};

/// A `!noinfo` marker this far into an answer is taken as content, not a refusal.
pub const NO_INFO_MARKER_GRACE: usize = 30;

/// Navigation tree built from the document's anchor links.
pub async fn links_intro(
    links: &[String],
    model: &dyn LanguageModel,
    language: &str,
) -> Result<String, ModelError> {
    info!(links = links.len(), "Generating navigation from links");
    let messages = [
        Message::system(build_language_prompt(language)),
        Message::system(LINKS_INTRO_PROMPT),
        Message::user(links.join("\n")),
    ];
    let intro = model.answer(&messages).await?;
    debug!(intro = %intro, "Navigation generated");
    Ok(intro)
}

/// Project overview written from the global summary.
pub async fn intro_text(
    global_info: &str,
    model: &dyn LanguageModel,
    language: &str,
) -> Result<String, ModelError> {
    info!("Generating project overview");
    let messages = [
        Message::system(build_language_prompt(language)),
        Message::system(INTRO_TEXT_PROMPT),
        Message::user(global_info),
    ];
    model.answer(&messages).await
}

/// True when `answer` carries information rather than a "nothing here" reply.
pub fn has_information(answer: &str) -> bool {
    let marker = answer.find(NO_INFO_MARKER);
    if marker.is_none() && !answer.contains(NO_INFO_PHRASE) {
        return true;
    }
    marker.is_some_and(|at| answer[..at].chars().count() > NO_INFO_MARKER_GRACE)
}

/// Answer `description` from the first chunk that has the information.
///
/// Chunks are tried in order, one model call each. Returns an empty string
/// when no chunk yields an answer.
pub async fn custom_description(
    chunks: &[String],
    model: &dyn LanguageModel,
    description: &str,
    language: &str,
) -> Result<String, ModelError> {
    let rules = custom_description_rules();
    for (index, chunk) in chunks.iter().enumerate() {
        let messages = [
            Message::system(build_language_prompt(language)),
            Message::system(CUSTOM_ANALYST_PROMPT),
            Message::system(format!("### Context: {}", chunk)),
            Message::system(rules.as_str()),
            Message::user(format!("### Task to describe: {}", description)),
        ];
        let answer = model.answer(&messages).await?;
        if has_information(&answer) {
            debug!(chunk = index, description, "Custom description found");
            return Ok(answer);
        }
    }

    info!(description, "No chunk had information for custom description");
    Ok(String::new())
}

/// Rewrite `description` into a section without code context.
pub async fn custom_rewrite(
    model: &dyn LanguageModel,
    description: &str,
    language: &str,
) -> Result<String, ModelError> {
    let messages = [
        Message::system(build_language_prompt(language)),
        Message::system(CUSTOM_REWRITE_ANALYST_PROMPT),
        Message::system(custom_rewrite_rules()),
        Message::user(format!("### Task to describe: {}", description)),
    ];
    model.answer(&messages).await
}
