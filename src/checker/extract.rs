//! HTML text extraction for the checker module
//!
//! Turns raw markup into the plain-text blob handed to the classifier.
//! Parsing goes through `scraper`/html5ever, which recovers from any
//! malformed input, so extraction never fails.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Maximum number of characters of body text kept in the excerpt
pub const BODY_EXCERPT_CHARS: usize = 2000;

/// Elements whose content is never readable text
const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Readable text pulled out of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Text of the first `<title>` element
    pub title: String,

    /// `content` of the first `<meta name="description">` tag
    pub meta_description: String,

    /// Tag-free, whitespace-collapsed body text, capped at [`BODY_EXCERPT_CHARS`]
    pub body_excerpt: String,
}

impl ExtractedContent {
    /// Compose the sections into one text blob, skipping empty ones
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        if !self.title.is_empty() {
            text.push_str(&format!("Title: {}\n", self.title));
        }
        if !self.meta_description.is_empty() {
            text.push_str(&format!("Description: {}\n", self.meta_description));
        }
        if !self.body_excerpt.is_empty() {
            text.push_str(&format!("Content: {}", self.body_excerpt));
        }
        text
    }

    /// Whether every section is empty
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.meta_description.is_empty() && self.body_excerpt.is_empty()
    }
}

/// Extract title, meta description and body text from raw HTML
///
/// # Arguments
///
/// * `html` - The raw markup, possibly malformed or empty
///
/// # Returns
///
/// The extracted content; absent elements leave their section empty
pub fn extract(html: &str) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title = first_title(&document).unwrap_or_default();
    let meta_description = meta_description(&document).unwrap_or_default();

    let body = collapse_whitespace(&readable_text(&document));
    let body_excerpt = truncate_chars(&body, BODY_EXCERPT_CHARS).to_string();

    ExtractedContent {
        title,
        meta_description,
        body_excerpt,
    }
}

fn first_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta").ok()?;
    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|content| !content.is_empty())
}

/// Concatenate every text node outside `<script>` and `<style>`
fn readable_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().filter_map(ElementRef::wrap).any(|element| {
            SKIPPED_ELEMENTS.contains(&element.value().name())
        });
        if !skipped {
            text.push_str(fragment);
        }
    }
    text
}

/// Collapse runs of whitespace to single spaces and trim
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
