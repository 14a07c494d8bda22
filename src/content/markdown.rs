//! Markdown to sanitized HTML.
//!
//! Parsing is delegated to `pulldown-cmark` with the GFM extensions enabled.
//! The event stream is rewritten so that h2/h3 carry anchor ids, external links
//! open in a new tab, and code is wrapped for highlighting. The final HTML goes
//! through `ammonia`, so author input can never inject script.

use std::ops::Range;

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use serde::Serialize;

use super::slugify;

/// HTML that has already been through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_external(href: &str) -> bool {
    href.starts_with("http")
}

/// First word of a fence info string, restricted to class-safe characters.
fn code_language(info: &str) -> Option<String> {
    let lang: String = info
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect();
    (!lang.is_empty()).then_some(lang)
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

struct OpenHeading<'a> {
    level: u8,
    slug: String,
    events: Vec<Event<'a>>,
}

/// Heading text as written in the source line, markers removed.
///
/// The anchor id is slugged from this raw text so it always equals the slug
/// the table of contents derives from the same line, even when the heading
/// holds links, emphasis or entities.
fn source_heading_text(raw: &str) -> &str {
    raw.lines()
        .next()
        .unwrap_or("")
        .trim_start()
        .trim_start_matches('#')
        .trim()
}

/// Rewrite the parser's events into the markup the blog page expects.
fn rewrite_events<'a>(
    source: &str,
    parser: impl Iterator<Item = (Event<'a>, Range<usize>)>,
) -> Vec<Event<'a>> {
    let mut out: Vec<Event<'a>> = Vec::new();
    let mut heading: Option<OpenHeading<'a>> = None;

    for (event, range) in parser {
        let rewritten = match event {
            Event::Start(Tag::Heading { level, .. })
                if matches!(level, HeadingLevel::H2 | HeadingLevel::H3) =>
            {
                let raw = source.get(range).unwrap_or("");
                heading = Some(OpenHeading {
                    level: heading_number(level),
                    slug: slugify(source_heading_text(raw)),
                    events: Vec::new(),
                });
                continue;
            }
            Event::End(TagEnd::Heading(level))
                if matches!(level, HeadingLevel::H2 | HeadingLevel::H3) =>
            {
                if let Some(open) = heading.take() {
                    out.push(Event::Html(CowStr::from(format!(
                        "<h{} id=\"{}\">",
                        open.level,
                        escape_attr(&open.slug)
                    ))));
                    out.extend(open.events);
                    out.push(Event::Html(CowStr::from(format!("</h{}>\n", open.level))));
                }
                continue;
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) => {
                let mut tag = format!("<a href=\"{}\"", escape_attr(&dest_url));
                if !title.is_empty() {
                    tag.push_str(&format!(" title=\"{}\"", escape_attr(&title)));
                }
                if is_external(&dest_url) {
                    tag.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
                }
                tag.push('>');
                Event::Html(CowStr::from(tag))
            }
            Event::End(TagEnd::Link) => Event::Html(CowStr::from("</a>")),
            Event::Start(Tag::CodeBlock(kind)) => {
                let class = match kind {
                    CodeBlockKind::Fenced(info) => match code_language(&info) {
                        Some(lang) => format!("hljs language-{}", lang),
                        None => "hljs".to_string(),
                    },
                    CodeBlockKind::Indented => "hljs".to_string(),
                };
                Event::Html(CowStr::from(format!(
                    "<pre class=\"code-block\"><code class=\"{}\">",
                    class
                )))
            }
            Event::End(TagEnd::CodeBlock) => Event::Html(CowStr::from("</code></pre>\n")),
            Event::Code(code) => Event::Html(CowStr::from(format!(
                "<code class=\"inline-code\">{}</code>",
                escape_attr(&code)
            ))),
            other => other,
        };

        match heading.as_mut() {
            Some(open) => open.events.push(rewritten),
            None => out.push(rewritten),
        }
    }

    out
}

fn sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .link_rel(None)
        .add_tags(["input"])
        .add_tag_attributes("a", ["target", "rel"])
        .add_tag_attributes("h2", ["id"])
        .add_tag_attributes("h3", ["id"])
        .add_tag_attributes("div", ["id"])
        .add_tag_attributes("pre", ["class"])
        .add_tag_attributes("code", ["class"])
        .add_tag_attributes("input", ["type", "checked", "disabled"]);
    builder
}

/// Render untrusted markdown to sanitized HTML.
pub fn render(markdown: &str) -> SafeHtml {
    let parser = Parser::new_ext(markdown, parser_options()).into_offset_iter();
    let events = rewrite_events(markdown, parser);

    let mut raw = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut raw, events.into_iter());

    SafeHtml(sanitizer().clean(&raw).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_get_anchor_ids() {
        let html = render("## What's New?\n\n### Sub `code` Heading\n\n# Title\n");
        assert!(html.as_str().contains(r#"<h2 id="whats-new">What's New?</h2>"#)
            || html.as_str().contains(r#"<h2 id="whats-new">What&#39;s New?</h2>"#));
        assert!(html.as_str().contains(r#"<h3 id="sub-code-heading">"#));
        assert!(html.as_str().contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_heading_ids_match_table_of_contents_slugs() {
        let source = "## See [the docs](https://x.io) & more\n\n### *Fast* `fn` &amp; safe\n\n## Plain\n";
        let html = render(source);
        let html = html.as_str();
        let toc = crate::content::extract_headings(source);
        assert_eq!(toc.len(), 3);
        for item in &toc {
            assert!(
                html.contains(&format!("id=\"{}\"", item.slug)),
                "missing anchor {} in {}",
                item.slug,
                html
            );
        }
        assert!(html.contains(r#"<h2 id="see-the-docshttpsxio-more">"#));
    }

    #[test]
    fn test_external_links_open_in_new_tab() {
        let html = render("[site](https://example.com) and [local](#intro)");
        let html = html.as_str();
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains(r#"rel="noopener noreferrer""#));
        assert!(html.contains("<a href=\"#intro\">local</a>"));
    }

    #[test]
    fn test_code_block_and_inline_code_differ() {
        let html = render("Use `cargo`.\n\n```rust\nfn main() {}\n```\n");
        let html = html.as_str();
        assert!(html.contains(r#"<code class="inline-code">cargo</code>"#));
        assert!(html.contains(r#"<pre class="code-block"><code class="hljs language-rust">"#));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_gfm_tables_and_strikethrough() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        let html = html.as_str();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_script_is_stripped() {
        let html = render("Hello <script>alert('x')</script>\n\n<img src=x onerror=alert(1)>\n\n[bad](javascript:alert(1))");
        let html = html.as_str();
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_code_language_is_sanitized() {
        assert_eq!(code_language("rust ignore"), Some("rust".to_string()));
        assert_eq!(code_language("c++"), Some("c++".to_string()));
        assert_eq!(code_language("\"><x"), Some("x".to_string()));
        assert_eq!(code_language(""), None);
    }
}
