pub mod html;
pub mod media;


use scraper::Selector;

/// Result of parsing a page served directly by the wiki (not via GraphQL)
pub struct ParseResult {
    /// Inner HTML of the page's content element
    pub content: String,
    /// Document title (if available)
    pub title: Option<String>,
}

impl ParseResult {
    /// Creates a new parse result with the given content and title
    pub fn new(content: String, title: Option<String>) -> Self {
        Self { content, title }
    }
}

/// Compiles a selector that is known to be valid at compile time
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}
