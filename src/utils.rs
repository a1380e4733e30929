use url::Url;

/// Longest folder or file name produced by `sanitize_filename`, in characters
const MAX_NAME_CHARS: usize = 100;

/// Convert a page path or file name to a valid, deterministic file name
pub fn sanitize_filename(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .take(MAX_NAME_CHARS)
        .collect();

    if out.is_empty() {
        out = "home".to_string();
    } else if out.chars().all(|c| c == '.') {
        out.insert(0, '_');
    }
    out
}

/// Scheme, host and port of `url` with an empty path
pub fn base_url(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Local file name for a media URL: the last path segment, percent-decoded and sanitized
pub fn media_file_name(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(sanitize_filename(&decoded))
}

/// Quote a string for use inside an XPath expression
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
