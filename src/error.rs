use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the credentials file. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("missing required config value: {0}")]
    Missing(&'static str),

    #[error("invalid login URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Errors raised by the browser login flow. Always fatal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("could not connect to WebDriver at {url}: {message}")]
    WebDriver { url: String, message: String },

    #[error("login page element not found: {0}")]
    SelectorNotFound(String),

    #[error("credentials rejected (still on {0})")]
    Rejected(String),

    #[error("browser command failed: {0}")]
    Browser(String),

    #[error("login produced no session cookies")]
    NoSession,
}

/// Transport-level failures of the authenticated session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid JSON response: {0}")]
    Decode(String),

    #[error("invalid URL {0}")]
    Url(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Http(err.to_string())
    }
}

/// Page enumeration failed. Fatal: without a page list there is nothing to do.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("page list request failed: {0}")]
    Session(#[from] SessionError),

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("malformed page list response: {0}")]
    Malformed(String),

    #[error("no pages discovered")]
    Empty,
}

/// A single page could not be retrieved. Recoverable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("page has no content")]
    MissingContent,

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("request failed: {0}")]
    Http(String),
}

impl From<SessionError> for FetchError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Status { status, url } => FetchError::Status { status, url },
            other => FetchError::Http(other.to_string()),
        }
    }
}

/// A single media asset could not be saved. Recoverable.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download of {url} failed: {source}")]
    Session {
        url: String,
        #[source]
        source: SessionError,
    },

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writing a page folder failed. Recoverable per page.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("could not build HTTP session: {0}")]
    Session(#[from] SessionError),

    #[error("could not prepare output directory {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
