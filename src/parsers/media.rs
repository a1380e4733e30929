use crate::parsers::selector;
use crate::results::MediaRef;
use crate::utils;
use regex::{Captures, Regex};
use scraper::Html;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Linked files that are archived alongside the page rather than treated as navigation
pub const DOCUMENT_EXTENSIONS: [&str; 10] = [
    "pdf", "docx", "doc", "xlsx", "xls", "pptx", "ppt", "zip", "csv", "txt",
];

/// Attributes that can point at a media file
static MEDIA_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(data-src|srcset|src|href|poster)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
        .expect("media attribute pattern should be valid")
});

/// Collects the media referenced by a page, in document order.
///
/// Relative URLs resolve against `base`. Each distinct URL appears once and gets
/// a file name that is unique (case-insensitively) within the page.
pub fn extract_media(html: &str, base: &Url) -> Vec<MediaRef> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut names = HashSet::new();
    let mut media = Vec::new();

    for el in doc.select(&selector("img, source, video, audio, a")) {
        let element = el.value();
        let mut candidates: Vec<&str> = Vec::new();

        match element.name() {
            "a" => {
                if let Some(href) = element.attr("href") {
                    candidates.push(href);
                }
            }
            name => {
                candidates.extend(element.attr("src"));
                if name == "img" {
                    candidates.extend(element.attr("data-src"));
                }
                if name == "video" {
                    candidates.extend(element.attr("poster"));
                }
                if let Some(srcset) = element.attr("srcset") {
                    candidates.extend(srcset_urls(srcset));
                }
            }
        }

        for candidate in candidates {
            let Some(url) = resolve_media_url(candidate, base) else {
                continue;
            };
            if element.name() == "a" && !is_document_url(&url) {
                continue;
            }
            if !seen.insert(url.to_string()) {
                continue;
            }
            let Some(file_name) = utils::media_file_name(&url) else {
                continue;
            };
            let file_name = unique_name(&file_name, &mut names);
            media.push(MediaRef { url, file_name });
        }
    }

    ::log::debug!("Found {} media references", media.len());
    media
}

/// Resolves an attribute value to an absolute http(s) URL without fragment
pub fn resolve_media_url(value: &str, base: &Url) -> Option<Url> {
    let value = value.trim();
    if value.is_empty()
        || value.starts_with('#')
        || ["data:", "blob:", "mailto:", "javascript:", "tel:"]
            .iter()
            .any(|p| value.starts_with(p))
    {
        return None;
    }

    let mut url = base.join(value).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Whether a link points at a downloadable document
pub fn is_document_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.rsplit_once('.')
        .map(|(_, ext)| DOCUMENT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// URLs listed in a `srcset` attribute
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|part| part.split_whitespace().next())
}

/// Returns `name`, or `stem-N.ext` when that name is already taken
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

/// Rewrites media attribute values in raw HTML.
///
/// `resolve` receives each (entity-decoded) attribute value and returns the
/// replacement, or `None` to leave the value untouched. `srcset` entries are
/// rewritten one URL at a time.
pub fn rewrite_media_refs<F>(html: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    MEDIA_ATTR_RE
        .replace_all(html, |caps: &Captures| {
            let attr = &caps[1];
            let (quote, value) = match (caps.get(3), caps.get(4)) {
                (Some(v), _) => ('"', v.as_str()),
                (None, Some(v)) => ('\'', v.as_str()),
                (None, None) => return caps[0].to_string(),
            };

            let rewritten = if attr.eq_ignore_ascii_case("srcset") {
                rewrite_srcset(value, &resolve)
            } else {
                resolve(&decode_entities(value)).unwrap_or_else(|| value.to_string())
            };

            format!("{}{}{quote}{rewritten}{quote}", attr, &caps[2])
        })
        .into_owned()
}

fn rewrite_srcset<F>(value: &str, resolve: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    value
        .split(',')
        .map(|part| {
            let part = part.trim();
            let mut pieces = part.splitn(2, char::is_whitespace);
            let url = pieces.next().unwrap_or_default();
            let descriptor = pieces.next().map(str::trim).unwrap_or_default();
            let url = resolve(&decode_entities(url)).unwrap_or_else(|| url.to_string());
            if descriptor.is_empty() {
                url
            } else {
                format!("{url} {descriptor}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_entities(value: &str) -> String {
    value.replace("&amp;", "&")
}
