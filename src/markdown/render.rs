// src/markdown/render.rs
// =============================================================================
// Markdown -> HTML with the two things the viewer needs from the renderer:
// - every heading carries an `id` (same ids the TOC links to: h1-h4 ATX
//   headings go through the same registry and the same parse as the TOC)
// - every image points at raw.githubusercontent.com instead of a dead
//   relative path
//
// We use pulldown-cmark, which gives us the document as a stream of events.
// We rewrite the stream on its way to the HTML writer:
//
//   Start(Heading) Text("Intro") End(Heading)
//     -> Html("<h2 id=\"intro\">") Text("Intro") Html("</h2>")
//
//   Start(Image(_, "../a.png", _))
//     -> Start(Image(_, "https://raw.githubusercontent.com/.../a.png", _))
// =============================================================================

use std::ops::Range;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Parser, Tag};

use super::slug::{generate_heading_id, HeadingIds};
use super::toc::{is_toc_heading, parser_options};
use super::url_transform::transform_image_url;

/// Where the document lives, for resolving relative images
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    /// Path of the document being rendered
    pub path: &'a str,
    pub git_ref: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    /// Ids given to h1-h4, in document order
    pub heading_ids: Vec<String>,
}

// A heading whose events are held back until we know its full text
struct OpenHeading<'a> {
    level: HeadingLevel,
    source: Range<usize>,
    text: String,
    events: Vec<Event<'a>>,
}

pub fn render_html(markdown: &str, ctx: &RenderContext<'_>) -> RenderedDocument {
    let mut ids = HeadingIds::new();
    let mut heading_ids = Vec::new();
    let mut output: Vec<Event> = Vec::new();
    let mut open: Option<OpenHeading> = None;

    for (event, range) in Parser::new_ext(markdown, parser_options()).into_offset_iter() {
        let event = match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                open = Some(OpenHeading {
                    level,
                    source: range,
                    text: String::new(),
                    events: Vec::new(),
                });
                continue;
            }
            Event::End(Tag::Heading(..)) => {
                if let Some(heading) = open.take() {
                    let n = heading.level as u8;
                    let source = markdown.get(heading.source).unwrap_or_default();
                    let text = heading.text.trim();
                    // h5/h6 and setext headings get a plain, unregistered slug
                    let id = if is_toc_heading(heading.level, source, text) {
                        let id = ids.issue(text);
                        heading_ids.push(id.clone());
                        id
                    } else {
                        generate_heading_id(text)
                    };

                    output.push(Event::Html(CowStr::from(format!("<h{n} id=\"{id}\">"))));
                    output.extend(heading.events);
                    output.push(Event::Html(CowStr::from(format!("</h{n}>\n"))));
                }
                continue;
            }
            Event::Start(Tag::Image(link_type, src, title)) => {
                let absolute =
                    transform_image_url(&src, ctx.owner, ctx.repo, ctx.path, ctx.git_ref);
                Event::Start(Tag::Image(link_type, CowStr::from(absolute), title))
            }
            other => other,
        };

        match open.as_mut() {
            Some(heading) => {
                if let Event::Text(text) | Event::Code(text) = &event {
                    heading.text.push_str(text);
                }
                heading.events.push(event);
            }
            None => output.push(event),
        }
    }

    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, output.into_iter());

    RenderedDocument {
        html: rendered,
        heading_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::toc::{generate_toc, heading_ids};

    fn ctx() -> RenderContext<'static> {
        RenderContext {
            owner: "o",
            repo: "r",
            path: "docs/guide/page.md",
            git_ref: None,
        }
    }

    #[test]
    fn test_headings_get_ids() {
        let doc = render_html("# Hello World\n\nText\n\n## Hello World\n", &ctx());

        assert!(doc.html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(doc.html.contains("<h2 id=\"hello-world-1\">Hello World</h2>"));
        assert_eq!(doc.heading_ids, vec!["hello-world", "hello-world-1"]);
    }

    #[test]
    fn test_ids_match_toc() {
        let markdown = "# Intro\n## Setup\n### `cargo` usage\n## Setup\n#### Deep dive\n";
        let doc = render_html(markdown, &ctx());
        assert_eq!(doc.heading_ids, heading_ids(&generate_toc(markdown)));
    }

    #[test]
    fn test_ids_match_toc_with_links_and_fences() {
        let markdown = "\
# Changelog

## [1.2.0](https://github.com/o/r/compare/v1.1.0...v1.2.0)

```bash
# Install
```

## Install

Overview
--------

## Install
";
        let doc = render_html(markdown, &ctx());

        assert_eq!(doc.heading_ids, vec!["changelog", "120", "install", "install-1"]);
        assert_eq!(doc.heading_ids, heading_ids(&generate_toc(markdown)));
        assert!(doc.html.contains("<h2 id=\"120\"><a href="));
        assert!(doc.html.contains("<h2 id=\"overview\">Overview</h2>"));
        // the fenced line stays code
        assert!(doc.html.contains("# Install\n</code></pre>"));
    }

    #[test]
    fn test_deep_headings_not_counted() {
        let doc = render_html("# A\n##### Fine print\n# A\n", &ctx());
        assert!(doc.html.contains("<h5 id=\"fine-print\">"));
        assert_eq!(doc.heading_ids, vec!["a", "a-1"]);
    }

    #[test]
    fn test_relative_images_are_rewritten() {
        let doc = render_html(
            "![diagram](../img/arch.png)\n\n![badge](https://img.shields.io/x.svg)\n",
            &ctx(),
        );

        assert!(doc
            .html
            .contains("src=\"https://raw.githubusercontent.com/o/r/main/docs/img/arch.png\""));
        assert!(doc.html.contains("src=\"https://img.shields.io/x.svg\""));
        assert!(doc.html.contains("alt=\"diagram\""));
    }

    #[test]
    fn test_inline_markup_inside_heading() {
        let doc = render_html("## Using *fast* mode\n", &ctx());
        assert!(doc
            .html
            .contains("<h2 id=\"using-fast-mode\">Using <em>fast</em> mode</h2>"));
    }
}
