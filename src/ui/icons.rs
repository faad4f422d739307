//! Glyphs shared by the reporter and spinners.
//!
//! Each glyph falls back to plain ASCII on terminals without Unicode support.

use console::Emoji;

// Report levels
pub static INFO: Emoji<'_, '_> = Emoji("ℹ", "i");
pub static SUCCESS: Emoji<'_, '_> = Emoji("✓", "[OK]");
pub static ERROR: Emoji<'_, '_> = Emoji("✗", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠", "[!]");

// Spinner outcomes
pub static DONE: Emoji<'_, '_> = Emoji("✔", "[OK]");
pub static FAILED: Emoji<'_, '_> = Emoji("✖", "[FAIL]");

// Progress bar cells
pub const BAR_FILLED: char = '█';
pub const BAR_EMPTY: char = '░';
