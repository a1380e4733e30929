use crate::error::DiscoveryError;
use crate::filter::UrlFilter;
use crate::parsers::html;
use crate::results::PageDescriptor;
use crate::session::{GraphqlResponse, WikiSession};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

/// Lists every page of a wiki.js v2 instance. The API returns the whole list at once.
pub const PAGE_LIST_QUERY: &str = "{ pages { list(orderBy: PATH) { id path locale title } } }";

#[derive(Debug, Deserialize)]
struct PageListData {
    pages: Option<PageListField>,
}

#[derive(Debug, Deserialize)]
struct PageListField {
    list: Option<Vec<ListedPage>>,
}

#[derive(Debug, Deserialize)]
struct ListedPage {
    id: i64,
    path: String,
    locale: Option<String>,
    title: Option<String>,
}

/// Enumerates the pages of the wiki.
///
/// Uses the GraphQL page list; if that fails or comes back empty, falls back to
/// the internal links of the wiki's home page. Order is preserved and duplicate
/// (locale, path) pairs are dropped.
pub async fn discover_pages<S>(session: &S) -> Result<Vec<PageDescriptor>, DiscoveryError>
where
    S: WikiSession + ?Sized,
{
    let primary = match session.graphql(PAGE_LIST_QUERY, json!({})).await {
        Ok(body) => parse_page_list(body),
        Err(e) => Err(DiscoveryError::from(e)),
    };

    match primary {
        Ok(pages) if !pages.is_empty() => {
            ::log::info!("GraphQL discovery found {} pages", pages.len());
            return Ok(pages);
        }
        Ok(_) => ::log::warn!("GraphQL page list is empty, falling back to link crawl"),
        Err(ref e) => ::log::warn!("GraphQL page list failed ({}), falling back to link crawl", e),
    }

    let crawled = crawl_home_links(session).await;
    if !crawled.is_empty() {
        ::log::info!("Link crawl discovered {} pages", crawled.len());
        return Ok(crawled);
    }

    Err(match primary {
        Err(e) => e,
        Ok(_) => DiscoveryError::Empty,
    })
}

/// Decodes a page list response into descriptors, keeping response order
pub fn parse_page_list(body: serde_json::Value) -> Result<Vec<PageDescriptor>, DiscoveryError> {
    let response: GraphqlResponse<PageListData> = GraphqlResponse::from_value(body)
        .map_err(|e| DiscoveryError::Malformed(e.to_string()))?;

    if let Some(message) = response.error_message() {
        return Err(DiscoveryError::Graphql(message));
    }

    let listed = response
        .data
        .and_then(|d| d.pages)
        .and_then(|p| p.list)
        .ok_or_else(|| DiscoveryError::Malformed("missing data.pages.list".to_string()))?;

    let mut seen = HashSet::new();
    let mut pages = Vec::with_capacity(listed.len());
    for page in listed {
        let path = page.path.trim_matches('/').to_string();
        if path.is_empty() {
            ::log::debug!("Skipping page {} with empty path", page.id);
            continue;
        }
        if !seen.insert((page.locale.clone(), path.clone())) {
            ::log::debug!("Skipping duplicate page {}", path);
            continue;
        }
        let title = page.title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| path.clone());
        pages.push(PageDescriptor {
            id: Some(page.id),
            path,
            locale: page.locale,
            title,
        });
    }
    Ok(pages)
}

/// Collects internal page links from the wiki home page
async fn crawl_home_links<S>(session: &S) -> Vec<PageDescriptor>
where
    S: WikiSession + ?Sized,
{
    let base = session.base_url();
    let home = match session.get_text(base).await {
        Ok(html) => html,
        Err(e) => {
            ::log::error!("Failed to load home page {}: {}", base, e);
            return Vec::new();
        }
    };

    let filter = UrlFilter::for_wiki(base);
    let mut seen = HashSet::new();
    let mut pages = Vec::new();

    for link in html::parse_links_only(&home) {
        let Ok(resolved) = base.join(&link) else {
            continue;
        };
        if !filter.accepts(&resolved) {
            ::log::debug!("URL filter rejected: {}", resolved);
            continue;
        }
        let normalized = filter.normalize_url(&resolved);
        let path = urlencoding::decode(normalized.path())
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| normalized.path().to_string())
            .trim_matches('/')
            .to_string();
        if path.is_empty() || !seen.insert(path.clone()) {
            continue;
        }
        pages.push(PageDescriptor {
            id: None,
            title: path.clone(),
            path,
            locale: None,
        });
    }
    pages
}
