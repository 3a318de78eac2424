// src/markdown/mod.rs
// =============================================================================
// Everything markview does with Markdown text itself.
//
// Submodules:
// - slug: heading id generation (shared by the TOC and the renderer)
// - toc: table of contents extraction and tree building
// - url_transform: relative image links -> raw.githubusercontent.com
// - render: HTML rendering with heading ids and rewritten images
// =============================================================================

mod render;
mod slug;
mod toc;
mod url_transform;

pub use render::{render_html, RenderContext, RenderedDocument};
pub use slug::{generate_heading_id, HeadingIds};
pub use toc::{flatten_toc, generate_toc, heading_ids, TocItem, MAX_TOC_LEVEL};
pub use url_transform::{is_absolute_url, transform_image_url, DEFAULT_REF};
