//! Semantic reordering of anchored sections.

use tracing::{debug, info, warn};

use super::anchors::{AnchorMap, split_by_anchor};
use crate::errors::ModelError;
use crate::model::{LanguageModel, Message};
use crate::prompts::build_order_prompt;

/// Separator placed between reordered sections.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Chars stripped from every title the model returns.
const TITLE_TRIM: &[char] = &['"', '\'', '`', '[', ']', '(', ')'];

/// Split the model's comma-separated answer into clean `#anchor` titles.
///
/// Titles the model returned without the leading `#` get it back.
pub fn parse_order(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(|t| t.trim().trim_matches(TITLE_TRIM).trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.starts_with('#') {
                t.to_string()
            } else {
                format!("#{}", t)
            }
        })
        .collect()
}

/// Ask the model for a semantic order of the sections and reassemble them.
///
/// Titles the model invents are skipped and titles it repeats are used once.
/// Sections it leaves out are appended afterwards in document order, so no
/// content is lost.
pub async fn reorder(map: &AnchorMap, model: &dyn LanguageModel) -> Result<String, ModelError> {
    let titles = map.titles();
    info!(sections = titles.len(), "Ordering documentation sections");
    if titles.len() < 2 {
        return Ok(assemble(map, &titles));
    }

    let messages = [Message::user(build_order_prompt(&titles))];
    let answer = model.answer(&messages).await?;
    let proposed = parse_order(&answer);
    debug!(?proposed, "Model proposed order");

    let mut order: Vec<&str> = Vec::with_capacity(titles.len());
    for title in &proposed {
        match titles.iter().copied().find(|t| *t == title.as_str()) {
            Some(known) if !order.contains(&known) => order.push(known),
            Some(_) => debug!(title = %title, "Skipping repeated title"),
            None => warn!(title = %title, "Model returned unknown section title, skipping"),
        }
    }

    let omitted: Vec<&str> = titles
        .iter()
        .copied()
        .filter(|t| !order.contains(t))
        .collect();
    if !omitted.is_empty() {
        warn!(?omitted, "Model left sections out of the order, appending them");
        order.extend(omitted);
    }

    Ok(assemble(map, &order))
}

/// Reorder `document` when it splits cleanly into anchored sections.
///
/// A document that does not split is returned unchanged without a model call.
pub async fn order_document(
    document: &str,
    model: &dyn LanguageModel,
) -> Result<String, ModelError> {
    match split_by_anchor(document) {
        Some(map) if !map.is_empty() => reorder(&map, model).await,
        Some(_) => Ok(document.to_string()),
        None => {
            warn!("Document anchors do not match its sections, skipping reorder");
            Ok(document.to_string())
        }
    }
}

fn assemble(map: &AnchorMap, order: &[&str]) -> String {
    order
        .iter()
        .filter_map(|title| map.get(title))
        .map(|body| format!("{}{}", body, SECTION_SEPARATOR))
        .collect()
}
