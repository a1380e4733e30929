use crate::error::FetchError;
use crate::parsers::{html, media};
use crate::results::{PageDescriptor, PageRecord};
use crate::session::{GraphqlResponse, WikiSession};
use serde::Deserialize;
use serde_json::json;

/// Fetches the rendered HTML of one page
pub const PAGE_CONTENT_QUERY: &str =
    "query ($id: Int!) { pages { single(id: $id) { id path locale title render } } }";

#[derive(Debug, Deserialize)]
struct SinglePageData {
    pages: Option<SinglePageField>,
}

#[derive(Debug, Deserialize)]
struct SinglePageField {
    single: Option<SinglePage>,
}

#[derive(Debug, Deserialize)]
struct SinglePage {
    title: Option<String>,
    render: Option<String>,
}

/// Retrieves a page's rendered HTML and the media it references.
///
/// Pages with a GraphQL id are read through the API; pages found by link crawl
/// are loaded directly and their content element is extracted.
pub async fn fetch_page<S>(session: &S, page: &PageDescriptor) -> Result<PageRecord, FetchError>
where
    S: WikiSession + ?Sized,
{
    let mut descriptor = page.clone();

    let html = match page.id {
        Some(id) => {
            let body = session.graphql(PAGE_CONTENT_QUERY, json!({ "id": id })).await?;
            let single = parse_single_page(body)?;
            if let Some(title) = single.title.filter(|t| !t.trim().is_empty()) {
                descriptor.title = title;
            }
            single.render.unwrap_or_default()
        }
        None => {
            let url = page
                .url(session.base_url())
                .ok_or_else(|| FetchError::Http(format!("invalid page path {}", page.path)))?;
            let parsed = html::parse(&session.get_text(&url).await?);
            if let Some(title) = parsed.title {
                descriptor.title = title;
            }
            parsed.content
        }
    };

    if html.trim().is_empty() {
        return Err(FetchError::MissingContent);
    }

    let media = media::extract_media(&html, session.base_url());
    ::log::debug!(
        "Fetched {} ({} bytes, {} media)",
        descriptor.path,
        html.len(),
        media.len()
    );

    Ok(PageRecord {
        descriptor,
        html,
        media,
    })
}

fn parse_single_page(body: serde_json::Value) -> Result<SinglePage, FetchError> {
    let response: GraphqlResponse<SinglePageData> =
        GraphqlResponse::from_value(body).map_err(|e| FetchError::Graphql(e.to_string()))?;

    if let Some(message) = response.error_message() {
        return Err(FetchError::Graphql(message));
    }

    response
        .data
        .and_then(|d| d.pages)
        .and_then(|p| p.single)
        .ok_or(FetchError::MissingContent)
}
