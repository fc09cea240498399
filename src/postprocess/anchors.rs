//! Anchor extraction from generated markdown.
//!
//! Sections of the generated document start with an HTML anchor of the form
//! `<a name="section-id"></a>` (quotes optional). Ids shorter than six chars
//! are treated as placeholders and ignored.

use regex::Regex;
use std::sync::LazyLock;

/// Ids must be longer than this to count as an anchor.
pub const MIN_ANCHOR_ID_LEN: usize = 5;

// Start of an eligible anchor, used as a split point.
static ANCHOR_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a name=["']?[^"'>\s]{6,200}["']?></a>"#).expect("anchor start regex is valid")
});

static LEADING_ANCHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<a name=["']?(.*?)["']?></a>"#).expect("leading anchor regex is valid")
});

static ANCHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a name=["']?(.*?)["']?></a>"#).expect("anchor regex is valid")
});

/// Document sections keyed by `#anchor-id`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorMap {
    entries: Vec<(String, String)>,
}

impl AnchorMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Section text for `#anchor-id`, anchor tag included.
    pub fn get(&self, title: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == title)
            .map(|(_, body)| body.as_str())
    }

    /// Anchor titles in document order.
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }
}

/// Id of an anchor that starts `section`, if long enough.
fn leading_anchor_id(section: &str) -> Option<&str> {
    let id = LEADING_ANCHOR_REGEX.captures(section)?.get(1)?.as_str();
    (id.chars().count() > MIN_ANCHOR_ID_LEN).then_some(id)
}

/// Partition `document` at every eligible anchor.
///
/// Returns `None` when the sections cannot be mapped one-to-one onto anchors:
/// text before the first anchor, a section whose leading anchor id is too
/// short, or the same id appearing twice.
pub fn split_by_anchor(document: &str) -> Option<AnchorMap> {
    let mut cuts: Vec<usize> = ANCHOR_START_REGEX
        .find_iter(document)
        .map(|m| m.start())
        .collect();
    cuts.push(document.len());

    let mut sections = Vec::with_capacity(cuts.len());
    let mut start = 0;
    for end in cuts {
        let section = document[start..end].trim();
        if !section.is_empty() {
            sections.push(section);
        }
        start = end;
    }

    let mut entries: Vec<(String, String)> = Vec::with_capacity(sections.len());
    for section in sections {
        let title = format!("#{}", leading_anchor_id(section)?);
        if entries.iter().any(|(existing, _)| *existing == title) {
            return None;
        }
        entries.push((title, section.to_string()));
    }

    Some(AnchorMap { entries })
}

/// Every anchor id in `document` longer than five chars, as `#id`, in order.
pub fn extract_html_links(document: &str) -> Vec<String> {
    ANCHOR_REGEX
        .captures_iter(document)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .filter(|id| id.chars().count() > MIN_ANCHOR_ID_LEN)
        .map(|id| format!("#{}", id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_sections() {
        let doc = r#"<a name="topic-one"></a>BODY1<a name="topic-two"></a>BODY2"#;
        let map = split_by_anchor(doc).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.titles(), vec!["#topic-one", "#topic-two"]);
        assert_eq!(map.get("#topic-one"), Some(r#"<a name="topic-one"></a>BODY1"#));
        assert_eq!(map.get("#topic-two"), Some(r#"<a name="topic-two"></a>BODY2"#));
    }

    #[test]
    fn test_split_accepts_unquoted_and_single_quoted() {
        let doc = "<a name=alpha-topic></a>\nA\n\n<a name='beta-topic'></a>\nB\n";
        let map = split_by_anchor(doc).unwrap();
        assert_eq!(map.titles(), vec!["#alpha-topic", "#beta-topic"]);
        assert_eq!(map.get("#beta-topic"), Some("<a name='beta-topic'></a>\nB"));
    }

    #[test]
    fn test_split_rejects_preamble() {
        let doc = r#"Intro text<a name="topic-one"></a>BODY1"#;
        assert!(split_by_anchor(doc).is_none());
    }

    #[test]
    fn test_short_anchor_does_not_split() {
        // "short" is 5 chars: not a split point, stays inside the first section.
        let doc = r#"<a name="topic-one"></a>A<a name="short"></a>B"#;
        let map = split_by_anchor(doc).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.get("#topic-one").unwrap().ends_with("B"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let doc = r#"<a name="topic-one"></a>A<a name="topic-one"></a>B"#;
        assert!(split_by_anchor(doc).is_none());
    }

    #[test]
    fn test_empty_document_gives_empty_map() {
        let map = split_by_anchor("  \n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_extract_html_links_filters_short_ids() {
        let doc = r#"<a name="setup-guide"></a> x <a name="abc"></a> y <a name=usage-notes></a>"#;
        assert_eq!(extract_html_links(doc), vec!["#setup-guide", "#usage-notes"]);
    }
}
