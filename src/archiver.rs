use crate::config::ScrapeConfig;
use crate::discovery;
use crate::error::ScrapeError;
use crate::fetcher;
use crate::persist::{self, FolderAllocator};
use crate::results::{PageDescriptor, PageOutcome, PageStatus, RunSummary};
use crate::session::{Authenticator, HttpSession, WikiSession};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where a run currently is. Phases only move forward, except that
/// `Saving` hands back to `Fetching` for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    NotLoggedIn,
    LoggedIn,
    Discovering,
    Fetching,
    Saving,
    Done,
}

impl Phase {
    pub fn can_advance_to(self, next: Phase) -> bool {
        next > self || (self == Phase::Saving && next == Phase::Fetching)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotLoggedIn => "not logged in",
            Phase::LoggedIn => "logged in",
            Phase::Discovering => "discovering",
            Phase::Fetching => "fetching",
            Phase::Saving => "saving",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs the archive pipeline for one wiki
pub struct Archiver {
    config: ScrapeConfig,
    force: bool,
    phase: Phase,
}

impl Archiver {
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            config,
            force: false,
            phase: Phase::NotLoggedIn,
        }
    }

    /// Overwrite existing files and re-fetch complete pages
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Logs in through the browser, then archives every page.
    ///
    /// The browser is closed inside the login step; the HTTP session lives
    /// until this call returns.
    pub async fn run(&mut self) -> Result<RunSummary, ScrapeError> {
        let cookies = Authenticator::new(&self.config).login().await?;
        let session = HttpSession::new(
            self.config.base_url(),
            &cookies,
            Duration::from_secs(self.config.request_timeout_secs),
            self.config.accept_invalid_certs,
        )?;
        self.advance(Phase::LoggedIn);

        self.run_with_session(&session).await
    }

    /// Archives every page reachable through an already authenticated session
    pub async fn run_with_session<S>(&mut self, session: &S) -> Result<RunSummary, ScrapeError>
    where
        S: WikiSession + ?Sized,
    {
        if self.phase < Phase::LoggedIn {
            self.advance(Phase::LoggedIn);
        }

        let out_dir = self.config.output_dir();
        std::fs::create_dir_all(&out_dir).map_err(|source| ScrapeError::Output {
            path: out_dir.clone(),
            source,
        })?;
        ::log::info!("Output directory: {}", out_dir.display());

        self.advance(Phase::Discovering);
        let pages = discovery::discover_pages(session).await?;
        ::log::info!("Total pages discovered: {}", pages.len());

        let mut folders = FolderAllocator::new(&out_dir);
        let mut summary = RunSummary::default();
        let total = pages.len();

        for (i, page) in pages.iter().enumerate() {
            let folder = folders.allocate(page);
            let outcome = self.process_page(session, page, folder).await;

            match &outcome.status {
                PageStatus::Succeeded => ::log::info!(
                    "Page succeeded ({}/{}): {} -> {}",
                    i + 1,
                    total,
                    outcome.path,
                    outcome.folder.display()
                ),
                PageStatus::Skipped => ::log::info!(
                    "Page skipped ({}/{}): {} already complete",
                    i + 1,
                    total,
                    outcome.path
                ),
                PageStatus::Failed(reason) => ::log::error!(
                    "Page failed ({}/{}): {}: {}",
                    i + 1,
                    total,
                    outcome.path,
                    reason
                ),
            }
            summary.push(outcome);
        }

        self.advance(Phase::Done);
        ::log::info!(
            "Scraping complete: {} succeeded, {} skipped, {} failed of {} pages in {}",
            summary.succeeded(),
            summary.skipped(),
            summary.failed(),
            summary.total(),
            out_dir.display()
        );
        Ok(summary)
    }

    /// Fetches and saves one page; every failure is turned into a `Failed` outcome
    async fn process_page<S>(&mut self, session: &S, page: &PageDescriptor, folder: PathBuf) -> PageOutcome
    where
        S: WikiSession + ?Sized,
    {
        if !self.force && persist::is_complete(&folder, page).await {
            return PageOutcome::skipped(&page.path, folder);
        }

        self.advance(Phase::Fetching);
        let record = match fetcher::fetch_page(session, page).await {
            Ok(record) => record,
            Err(e) => return PageOutcome::failed(&page.path, folder, e.to_string()),
        };

        self.advance(Phase::Saving);
        match persist::save_page(session, &record, &folder, self.force).await {
            Ok(stats) => PageOutcome {
                path: page.path.clone(),
                folder,
                status: PageStatus::Succeeded,
                media_downloaded: stats.downloaded,
                media_failed: stats.failed,
            },
            Err(e) => PageOutcome::failed(&page.path, folder, e.to_string()),
        }
    }

    fn advance(&mut self, next: Phase) {
        if self.phase == next {
            return;
        }
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid phase change {} -> {}",
            self.phase,
            next
        );
        ::log::debug!("Phase: {} -> {}", self.phase, next);
        self.phase = next;
    }
}
