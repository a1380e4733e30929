use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Minimal identifying record for one wiki page, as returned by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// GraphQL page id (absent for pages found by link crawl)
    pub id: Option<i64>,

    /// Page path without locale (e.g. `home` or `home/subpage`)
    pub path: String,

    /// Page locale, if the wiki reports one
    pub locale: Option<String>,

    /// Title of the page
    pub title: String,
}

impl PageDescriptor {
    /// Create a descriptor for a page found via GraphQL
    pub fn new(id: i64, path: &str, locale: Option<&str>, title: &str) -> Self {
        Self {
            id: Some(id),
            path: path.to_string(),
            locale: locale.map(str::to_string),
            title: title.to_string(),
        }
    }

    /// Public URL of the page on the wiki
    pub fn url(&self, base: &Url) -> Option<Url> {
        base.join(self.path.trim_start_matches('/')).ok()
    }
}

/// A media asset referenced by a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Absolute URL to download from
    pub url: Url,

    /// File name under the page's `media/` folder
    pub file_name: String,
}

/// One fetched page, ready to be saved
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub descriptor: PageDescriptor,

    /// Rendered content HTML
    pub html: String,

    pub media: Vec<MediaRef>,
}

/// Final state of one page after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Succeeded,
    /// Already complete on disk from an earlier run
    Skipped,
    Failed(String),
}

/// Per-page result recorded by the run
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub path: String,
    pub folder: PathBuf,
    pub status: PageStatus,
    pub media_downloaded: usize,
    pub media_failed: usize,
}

impl PageOutcome {
    pub fn skipped(path: &str, folder: PathBuf) -> Self {
        Self {
            path: path.to_string(),
            folder,
            status: PageStatus::Skipped,
            media_downloaded: 0,
            media_failed: 0,
        }
    }

    pub fn failed(path: &str, folder: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            folder,
            status: PageStatus::Failed(reason.into()),
            media_downloaded: 0,
            media_failed: 0,
        }
    }
}

/// Ordered list of page outcomes for a finished run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<PageOutcome>,
}

impl RunSummary {
    pub fn push(&mut self, outcome: PageOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Succeeded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Failed(_)))
    }

    pub fn media_downloaded(&self) -> usize {
        self.outcomes.iter().map(|o| o.media_downloaded).sum()
    }

    pub fn media_failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.media_failed).sum()
    }

    fn count(&self, pred: impl Fn(&PageStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
