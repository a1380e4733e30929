use crate::error::ConfigError;
use crate::utils;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Keys that must be present and non-empty in the credentials file
pub const REQUIRED_KEYS: [&str; 3] = ["page", "user", "password"];

/// Configuration for a scrape run, loaded from a dotenv-style file
#[derive(Clone)]
pub struct ScrapeConfig {
    /// Login page of the wiki (e.g. `https://wiki.example.com/login`)
    pub login_url: Url,

    /// LDAP / Active Directory user name
    pub user: String,

    /// LDAP / Active Directory password
    pub password: String,

    /// Name of the output folder under `data_dir`
    pub wiki_name: String,

    /// URL for the WebDriver instance
    pub webdriver_url: String,

    /// Root of the archived output
    pub data_dir: PathBuf,

    /// Directory that receives one log file per run
    pub logs_dir: PathBuf,

    /// Run the browser without a window
    pub headless: bool,

    /// Accept self-signed certificates in both the browser and the HTTP client
    pub accept_invalid_certs: bool,

    /// Text of the login strategy entry to click
    pub ldap_strategy_label: String,

    /// Text of the login form's submit button
    pub submit_label: String,

    /// Per-request timeout for GraphQL and media requests
    pub request_timeout_secs: u64,
}

/// Flat key/value shape of the file before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    page: String,
    user: String,
    password: String,

    #[serde(default)]
    wiki_name: Option<String>,

    #[serde(default = "default_webdriver_url")]
    webdriver_url: String,

    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,

    #[serde(default = "default_logs_dir")]
    logs_dir: PathBuf,

    #[serde(default = "default_true", deserialize_with = "bool_from_str")]
    headless: bool,

    #[serde(default = "default_true", deserialize_with = "bool_from_str")]
    accept_invalid_certs: bool,

    #[serde(default = "default_ldap_strategy_label")]
    ldap_strategy_label: String,

    #[serde(default = "default_submit_label")]
    submit_label: String,

    #[serde(
        default = "default_request_timeout_secs",
        deserialize_with = "u64_from_str"
    )]
    request_timeout_secs: u64,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}

fn default_ldap_strategy_label() -> String {
    "LDAP / Active Directory".to_string()
}

fn default_submit_label() -> String {
    "Anmeldung".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn bool_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got {other:?}"
        ))),
    }
}

fn u64_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = String::deserialize(deserializer)?;
    value.trim().parse().map_err(serde::de::Error::custom)
}

impl ScrapeConfig {
    /// Load configuration from a dotenv-style file without touching the process environment
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_error = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut pairs = Vec::new();
        for item in dotenvy::from_path_iter(path).map_err(read_error)? {
            pairs.push(item.map_err(read_error)?);
        }

        let mut config = Self::from_pairs(pairs)?;

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        Ok(config)
    }

    /// Build configuration from key/value pairs. Keys are case-insensitive.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = serde_json::Map::new();
        for (key, value) in pairs {
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }
            map.insert(
                key.as_ref().trim().to_ascii_lowercase(),
                serde_json::Value::String(value),
            );
        }

        for key in REQUIRED_KEYS {
            if !map.contains_key(key) {
                return Err(ConfigError::Missing(key));
            }
        }

        let raw: RawConfig = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let login_url = Url::parse(raw.page.trim()).map_err(|source| ConfigError::InvalidUrl {
            url: raw.page.clone(),
            source,
        })?;

        let wiki_name = match raw.wiki_name {
            Some(name) => utils::sanitize_filename(&name),
            None => login_url.host_str().unwrap_or("wiki").to_string(),
        };

        Ok(Self {
            login_url,
            user: raw.user,
            password: raw.password,
            wiki_name,
            webdriver_url: raw.webdriver_url,
            data_dir: raw.data_dir,
            logs_dir: raw.logs_dir,
            headless: raw.headless,
            accept_invalid_certs: raw.accept_invalid_certs,
            ldap_strategy_label: raw.ldap_strategy_label,
            submit_label: raw.submit_label,
            request_timeout_secs: raw.request_timeout_secs,
        })
    }

    /// Scheme, host and port of the wiki, derived from the login URL
    pub fn base_url(&self) -> Url {
        utils::base_url(&self.login_url)
    }

    /// Directory that receives this wiki's page folders
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(&self.wiki_name)
    }
}

impl fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("login_url", &self.login_url.as_str())
            .field("user", &self.user)
            .field("password", &"***")
            .field("wiki_name", &self.wiki_name)
            .field("webdriver_url", &self.webdriver_url)
            .field("data_dir", &self.data_dir)
            .field("logs_dir", &self.logs_dir)
            .field("headless", &self.headless)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_env(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_env(
            "page = \"https://example.com/login\"\nuser = \"alice\"\npassword = \"s3cret\"\n",
        );
        let config = ScrapeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.login_url.as_str(), "https://example.com/login");
        assert_eq!(config.user, "alice");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.wiki_name, "example.com");
        assert!(config.headless);
        assert_eq!(config.output_dir(), PathBuf::from("data/example.com"));
    }

    #[test]
    fn test_missing_password_is_named() {
        let file = write_env("page = \"https://example.com/login\"\nuser = \"bob\"\n");
        let err = ScrapeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("password")));
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_each_missing_field_is_named() {
        let full = [
            ("page", "https://example.com/login"),
            ("user", "alice"),
            ("password", "s3cret"),
        ];
        for skipped in REQUIRED_KEYS {
            let pairs = full.iter().filter(|(k, _)| *k != skipped).copied();
            match ScrapeConfig::from_pairs(pairs) {
                Err(ConfigError::Missing(key)) => assert_eq!(key, skipped),
                other => panic!("expected Missing({skipped}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let pairs = [
            ("page", "https://example.com/login"),
            ("user", "   "),
            ("password", "s3cret"),
        ];
        assert!(matches!(
            ScrapeConfig::from_pairs(pairs),
            Err(ConfigError::Missing("user"))
        ));
    }

    #[test]
    fn test_empty_file() {
        let file = write_env("");
        assert!(matches!(
            ScrapeConfig::from_file(file.path()),
            Err(ConfigError::Missing("page"))
        ));
    }

    #[test]
    fn test_invalid_login_url() {
        let pairs = [("page", "not a url"), ("user", "a"), ("password", "b")];
        assert!(matches!(
            ScrapeConfig::from_pairs(pairs),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_optional_values() {
        let pairs = [
            ("PAGE", "http://localhost:3000/login"),
            ("USER", "alice"),
            ("PASSWORD", "1234"),
            ("wiki_name", "IMI Wiki"),
            ("headless", "false"),
            ("request_timeout_secs", "5"),
        ];
        let config = ScrapeConfig::from_pairs(pairs).unwrap();
        assert_eq!(config.password, "1234");
        assert_eq!(config.wiki_name, "IMI_Wiki");
        assert!(!config.headless);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.base_url().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_debug_hides_password() {
        let pairs = [
            ("page", "https://example.com/login"),
            ("user", "alice"),
            ("password", "s3cret"),
        ];
        let config = ScrapeConfig::from_pairs(pairs).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
