//! # wikijs-archiver
//!
//! Archives the pages and media of a single wiki.js instance to a local
//! directory tree.
//!
//! The pipeline logs in through the wiki's LDAP / Active Directory login form in
//! a WebDriver-controlled browser, carries the session cookies over to an HTTP
//! client, lists every page through the GraphQL API and saves each page's
//! rendered HTML and media under `data/<wiki-name>/<page-slug>/`. Pages that
//! are already complete on disk are skipped, so an interrupted run can simply
//! be started again.
//!
//! ```no_run
//! use wikijs_archiver::{Archiver, ScrapeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScrapeConfig::from_file(".env")?;
//! let summary = Archiver::new(config).run().await?;
//! println!("{} pages saved", summary.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod archiver;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod logging;
pub mod media;
pub mod parsers;
pub mod persist;
pub mod report;
pub mod results;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use archiver::{Archiver, Phase};
pub use config::ScrapeConfig;
pub use error::{
    AuthError, ConfigError, DiscoveryError, DownloadError, FetchError, PersistError, ScrapeError,
    SessionError,
};
pub use results::{MediaRef, PageDescriptor, PageOutcome, PageRecord, PageStatus, RunSummary};
pub use session::{GraphqlResponse, HttpSession, WikiSession};
