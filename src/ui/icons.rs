//! Shared UI icons.
//!
//! Each icon falls back to a plain-text tag on terminals without emoji support.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static PAGE: Emoji<'_, '_> = Emoji("📄 ", "- ");
