use crate::parsers::{ParseResult, selector};
use scraper::Html;

/// Elements that hold the rendered page body on a wiki.js page, most specific first
const CONTENT_SELECTORS: [&str; 5] = [".contents", ".page-content", "#page-content", "article", "main"];

/// Parses a full wiki page to extract the content HTML and the title
pub fn parse(html: &str) -> ParseResult {
    let doc = Html::parse_document(html);

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|css| doc.select(&selector(css)).next())
        .or_else(|| doc.select(&selector("body")).next())
        .map(|el| el.inner_html())
        .unwrap_or_else(|| html.to_string());

    let title = doc
        .select(&selector("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    ::log::debug!(
        "HTML parser extracted {} bytes of content (title: {:?})",
        content.len(),
        title
    );

    ParseResult::new(content.trim().to_string(), title)
}

/// Parses HTML content and only extracts links (no text)
pub fn parse_links_only(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);

    // Extract links
    doc.select(&selector("a"))
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect()
}
