/*!
 * Blog Content
 * Reading time, table of contents and markdown rendering for post bodies.
 */
pub mod markdown;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use markdown::{render, SafeHtml};

const WORDS_PER_MINUTE: usize = 200;

lazy_static::lazy_static! {
    /// `## Heading` or `### Heading` at the start of a line.
    static ref HEADING_REGEX: Regex = Regex::new(r"(?m)^(#{2,3})[ \t]+(.+)$").unwrap();
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-+").unwrap();
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    pub level: u8,
    pub text: String,
    pub slug: String,
}

/// Display metadata derived from a post body. Never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogContent {
    pub html: SafeHtml,
    pub table_of_contents: Vec<TocItem>,
    pub reading_time_minutes: u32,
}

impl BlogContent {
    pub fn derive(text: &str) -> Self {
        Self {
            html: render(text),
            table_of_contents: extract_headings(text),
            reading_time_minutes: reading_time_minutes(text),
        }
    }
}

/// Minutes to read `text` at 200 words per minute; at least one.
pub fn reading_time_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Level 2 and 3 headings in document order. Level 1 and 4+ are skipped.
pub fn extract_headings(text: &str) -> Vec<TocItem> {
    HEADING_REGEX
        .captures_iter(text)
        .map(|caps| {
            let text = caps[2].trim().to_string();
            TocItem {
                level: caps[1].len() as u8,
                slug: slugify(&text),
                text,
            }
        })
        .collect()
}

/// Anchor-safe slug: lowercase ascii letters, digits and single hyphens.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lower, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    let trimmed = collapsed.strip_prefix('-').unwrap_or(&collapsed);
    trimmed.strip_suffix('-').unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_reading_time_boundaries() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("   \n\t "), 1);
        assert_eq!(reading_time_minutes(&words(200)), 1);
        assert_eq!(reading_time_minutes(&words(201)), 2);
        assert_eq!(reading_time_minutes(&words(1000)), 5);
    }

    #[test]
    fn test_extract_headings_levels_and_order() {
        let text = "# Title\n## Intro\n\nSome text\n### Sub Heading\n#### Deep";
        let toc = extract_headings(text);
        assert_eq!(
            toc,
            vec![
                TocItem {
                    level: 2,
                    text: "Intro".to_string(),
                    slug: "intro".to_string()
                },
                TocItem {
                    level: 3,
                    text: "Sub Heading".to_string(),
                    slug: "sub-heading".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_extract_headings_requires_space() {
        assert!(extract_headings("##NoSpace\n").is_empty());
        assert!(extract_headings("").is_empty());
        assert!(extract_headings("text ## not at line start").is_empty());
    }

    #[test]
    fn test_extract_headings_handles_crlf() {
        let toc = extract_headings("## Windows\r\nbody\r\n");
        assert_eq!(toc[0].text, "Windows");
        assert_eq!(toc[0].slug, "windows");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Hello,   World -- again "), "hello-world-again");
        assert_eq!(slugify("Rust & C++"), "rust-c");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in ["What's New?", "Sub Heading", "a  -  b", "Ãfaan Oromoo 2024"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_blog_content_derive() {
        let content = BlogContent::derive("## Setup\n\nInstall it.");
        assert_eq!(content.reading_time_minutes, 1);
        assert_eq!(content.table_of_contents.len(), 1);
        assert!(content.html.as_str().contains(r#"id="setup""#));
    }
}
