use regex::Regex;
use url::Url;

/// Paths a wiki.js instance serves that are not content pages
const WIKI_SYSTEM_PATTERNS: [&str; 4] = [
    r"^/(login|logout|register|graphql|healthz|favicon\.ico)(/|$)",
    r"^/_",
    r"^/(a|t|s|e|h|i)(/|$)",
    r"\.(jpg|jpeg|png|gif|css|js|ico|svg|woff|woff2|ttf|eot|pdf|zip|docx?|xlsx?|pptx?|csv|txt)$",
];

/// Configuration for filtering links found on wiki pages
#[derive(Debug, Clone)]
pub struct UrlFilterConfig {
    /// Host a link must point at (if None, every host is accepted)
    pub required_host: Option<String>,

    /// Port a link must point at (defaults to the scheme's port)
    pub required_port: Option<u16>,

    /// Regex patterns matched case-insensitively against the URL path
    pub exclude_patterns: Vec<String>,
}

impl UrlFilterConfig {
    /// Filter for internal content pages of the wiki at `base`
    pub fn for_wiki(base: &Url) -> Self {
        Self {
            required_host: base.host_str().map(str::to_string),
            required_port: base.port_or_known_default(),
            exclude_patterns: WIKI_SYSTEM_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// URL filter that decides which discovered links are wiki pages
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(&format!("(?i){pattern}"))?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Filter for internal content pages of the wiki at `base`
    pub fn for_wiki(base: &Url) -> Self {
        Self::new(UrlFilterConfig::for_wiki(base)).expect("built-in wiki patterns should be valid")
    }

    /// Determine if a URL is a content page based on all filtering rules
    pub fn accepts(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if !self.is_in_host_scope(url) {
            return false;
        }

        let path = url.path().trim_end_matches('/');
        if path.is_empty() {
            return false;
        }

        !self.exclude_regexes.iter().any(|re| re.is_match(path))
    }

    /// Check if a URL points at the required host and port
    fn is_in_host_scope(&self, url: &Url) -> bool {
        if let Some(host) = &self.config.required_host {
            if url.host_str() != Some(host.as_str()) {
                return false;
            }
        }
        if let Some(port) = self.config.required_port {
            if url.port_or_known_default() != Some(port) {
                return false;
            }
        }
        true
    }

    /// Create a normalized version of the URL (no fragment, no query, no trailing slash)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized.set_query(None);
        let trimmed = normalized.path().trim_end_matches('/').to_string();
        if !trimmed.is_empty() {
            normalized.set_path(&trimmed);
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki_filter() -> UrlFilter {
        UrlFilter::for_wiki(&Url::parse("https://wiki.example.com/").unwrap())
    }

    #[test]
    fn test_accepts_internal_pages() {
        let filter = wiki_filter();
        let page = Url::parse("https://wiki.example.com/home/subpage").unwrap();
        assert!(filter.accepts(&page));
    }

    #[test]
    fn test_rejects_other_hosts_and_ports() {
        let filter = wiki_filter();
        let other = Url::parse("https://other.example.com/home").unwrap();
        assert!(!filter.accepts(&other));

        let other_port = Url::parse("https://wiki.example.com:8443/home").unwrap();
        assert!(!filter.accepts(&other_port));
    }

    #[test]
    fn test_rejects_wiki_system_paths() {
        let filter = wiki_filter();
        for path in [
            "/",
            "/login",
            "/logout",
            "/register",
            "/graphql",
            "/healthz",
            "/_assets/app.js",
            "/a/pages",
            "/t/tag",
            "/h/en/home",
            "/uploads/logo.PNG",
            "/files/report.pdf",
        ] {
            let url = Url::parse(&format!("https://wiki.example.com{path}")).unwrap();
            assert!(!filter.accepts(&url), "{path} should be rejected");
        }
    }

    #[test]
    fn test_login_prefix_is_not_a_system_path() {
        let filter = wiki_filter();
        let page = Url::parse("https://wiki.example.com/login-help").unwrap();
        assert!(filter.accepts(&page));
    }

    #[test]
    fn test_custom_exclude_patterns_ignore_case() {
        let config = UrlFilterConfig {
            required_host: None,
            required_port: None,
            exclude_patterns: vec![r"/draft/".to_string()],
        };
        let filter = UrlFilter::new(config).unwrap();

        assert!(filter.accepts(&Url::parse("https://x.org/docs/page").unwrap()));
        assert!(filter.accepts(&Url::parse("https://other.org/blog/post").unwrap()));
        assert!(!filter.accepts(&Url::parse("https://x.org/docs/Draft/page").unwrap()));
    }

    #[test]
    fn test_normalize_url() {
        let filter = wiki_filter();
        let url = Url::parse("https://wiki.example.com/home/?x=1#top").unwrap();
        assert_eq!(
            filter.normalize_url(&url).as_str(),
            "https://wiki.example.com/home"
        );
    }
}
