// src/markdown/slug.rs
// =============================================================================
// Heading ids.
//
// The renderer and the table of contents must agree on the id of a heading,
// otherwise clicking a TOC entry scrolls nowhere. Both go through this file.
//
// Slug rules:
// 1. lower-case the text
// 2. drop everything that isn't a word character ([A-Za-z0-9_], ASCII
//    only), whitespace or '-'
// 3. turn runs of whitespace and '-' into a single '-'
// 4. no leading or trailing '-'
// 5. an empty result becomes "heading"
// =============================================================================

use std::collections::HashSet;

/// Fallback id for headings whose text has no word characters
pub const FALLBACK_ID: &str = "heading";

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Slug for a single heading text, without duplicate handling
//
// Parameters:
//   text: the heading's plain text (no Markdown syntax)
//
// Returns: the slug, or FALLBACK_ID when nothing is left
//
// Example:
//   "What's new in v2.0?" -> "whats-new-in-v20"
pub fn generate_heading_id(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        // Separators only become a hyphen once another word char follows
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if is_word_char(c) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
        // anything else is stripped without breaking the current run
    }

    if slug.is_empty() {
        FALLBACK_ID.to_string()
    } else {
        slug
    }
}

/// Issues document-unique ids.
///
/// The first heading with a given slug keeps it; later ones get `-1`, `-2`, ...
/// skipping any id that was already issued.
#[derive(Debug, Default)]
pub struct HeadingIds {
    issued: HashSet<String>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, text: &str) -> String {
        let base = generate_heading_id(text);
        let mut id = base.clone();
        let mut counter = 1;

        while self.issued.contains(&id) {
            id = format!("{base}-{counter}");
            counter += 1;
        }

        self.issued.insert(id.clone());
        id
    }
}
