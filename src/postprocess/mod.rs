//! Post-processing of the generated document.
//!
//! - `anchors`: split a document into anchored sections, collect anchor links
//! - `ordering`: ask the model for a semantic section order and reassemble
//! - `intro`: navigation, overview and custom sections

pub mod anchors;
pub mod intro;
pub mod ordering;

pub use anchors::{AnchorMap, extract_html_links, split_by_anchor};
pub use intro::{custom_description, custom_rewrite, intro_text, links_intro};
pub use ordering::{order_document, reorder};
