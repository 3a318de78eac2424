// src/markdown/toc.rs
// =============================================================================
// Table of contents generation.
//
// How it works:
// 1. Parse the document with pulldown-cmark and pick out the ATX headings
//    ("## Title"); '#' lines inside code fences are code, not headings
// 2. Keep levels 1-4 and give each one a document-unique id, slugged from
//    the heading's plain text (link targets and backticks don't count)
// 3. Fold the flat list into a forest with a stack of open ancestors
//
// The renderer walks the same parse with the same `is_toc_heading` rule,
// so the ids it writes into the HTML are exactly the ids listed here.
//
// The stack never needs recursion, so jumps like h1 -> h4 -> h2 just work:
// the h4 becomes a child of the h1 and the h2 pops it again.
// =============================================================================

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

use super::slug::HeadingIds;

/// Deepest heading level that shows up in the TOC
pub const MAX_TOC_LEVEL: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<TocItem>,
}

// Both the TOC and the renderer parse with these
pub(crate) fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Whether a parsed heading gets a TOC entry (and a registered id).
///
/// `source` is the heading's own Markdown; setext headings ("Title\n===")
/// don't start with '#' and are left out.
pub(crate) fn is_toc_heading(level: HeadingLevel, source: &str, text: &str) -> bool {
    (level as u8) <= MAX_TOC_LEVEL
        && source.trim_start().starts_with('#')
        && !text.trim().is_empty()
}

// Heading being collected: level, source range, plain text so far
type OpenHeading = (HeadingLevel, Range<usize>, String);

// Flat list of TOC headings in document order, children still empty
fn extract_headings(markdown: &str) -> Vec<TocItem> {
    let mut ids = HeadingIds::new();
    let mut headings = Vec::new();
    let mut open: Option<OpenHeading> = None;

    for (event, range) in Parser::new_ext(markdown, parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                open = Some((level, range, String::new()));
            }
            Event::End(Tag::Heading(..)) => {
                let Some((level, source, text)) = open.take() else {
                    continue;
                };
                let source = markdown.get(source).unwrap_or_default();
                if !is_toc_heading(level, source, &text) {
                    continue;
                }

                let text = text.trim().to_string();
                headings.push(TocItem {
                    id: ids.issue(&text),
                    text,
                    level: level as u8,
                    children: Vec::new(),
                });
            }
            // Link and image targets never show up as Text, only their labels
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, heading)) = open.as_mut() {
                    heading.push_str(&text);
                }
            }
            _ => {}
        }
    }

    headings
}

// Monotonic stack: a heading closes every open ancestor of the same or a
// deeper level. A closed node is attached to whatever is below it on the
// stack, or becomes a root when nothing is.
fn build_tree(headings: Vec<TocItem>) -> Vec<TocItem> {
    let mut roots = Vec::new();
    let mut open: Vec<TocItem> = Vec::new();

    fn close(open: &mut Vec<TocItem>, roots: &mut Vec<TocItem>) {
        if let Some(node) = open.pop() {
            match open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }

    for heading in headings {
        while open.last().is_some_and(|top| top.level >= heading.level) {
            close(&mut open, &mut roots);
        }
        open.push(heading);
    }

    while !open.is_empty() {
        close(&mut open, &mut roots);
    }

    roots
}

// Builds the TOC forest for a Markdown document
//
// Parameters:
//   markdown: the raw document text
//
// Returns: root TocItems in document order, each with its nested children
//
// Example:
//   "# A\n## B\n# C" -> [A { children: [B] }, C]
pub fn generate_toc(markdown: &str) -> Vec<TocItem> {
    build_tree(extract_headings(markdown))
}

/// Pre-order walk: every item before its children, siblings in order
pub fn flatten_toc(toc: &[TocItem]) -> Vec<&TocItem> {
    let mut flat = Vec::new();
    let mut pending: Vec<&TocItem> = toc.iter().rev().collect();

    while let Some(item) = pending.pop() {
        flat.push(item);
        pending.extend(item.children.iter().rev());
    }

    flat
}

/// Ids of every TOC entry in document order (what the scroll spy watches)
pub fn heading_ids(toc: &[TocItem]) -> Vec<String> {
    flatten_toc(toc).into_iter().map(|item| item.id.clone()).collect()
}
