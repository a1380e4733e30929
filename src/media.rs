use crate::error::DownloadError;
use crate::results::MediaRef;
use crate::session::WikiSession;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Counts for one page's media downloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStats {
    pub downloaded: usize,
    /// Already present on disk; no request was made
    pub skipped: usize,
    pub failed: usize,
}

/// Downloads a page's media into `media_dir`, one asset at a time.
///
/// Existing non-empty files are left alone unless `force` is set. Failures are
/// logged with the page path and do not stop the remaining downloads.
pub async fn download_all<S>(
    session: &S,
    media: &[MediaRef],
    media_dir: &Path,
    page_path: &str,
    force: bool,
) -> MediaStats
where
    S: WikiSession + ?Sized,
{
    let mut stats = MediaStats::default();

    for item in media {
        let target = media_dir.join(&item.file_name);
        if !force && is_nonempty_file(&target).await {
            ::log::debug!("Media already present: {}", target.display());
            stats.skipped += 1;
            continue;
        }

        match download_one(session, item, &target).await {
            Ok(()) => stats.downloaded += 1,
            Err(e) => {
                ::log::warn!("[{}] {}", page_path, e);
                stats.failed += 1;
            }
        }
    }

    ::log::info!(
        "[{}] media: {} downloaded, {} already present, {} failed",
        page_path,
        stats.downloaded,
        stats.skipped,
        stats.failed
    );
    stats
}

/// Fetches one asset and writes it via a temporary file so an interrupted
/// write never leaves a non-empty partial file under the final name
async fn download_one<S>(session: &S, item: &MediaRef, target: &Path) -> Result<(), DownloadError>
where
    S: WikiSession + ?Sized,
{
    let bytes = session
        .get_bytes(&item.url)
        .await
        .map_err(|source| DownloadError::Session {
            url: item.url.to_string(),
            source,
        })?;

    let partial = partial_path(target);
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DownloadError::Io { path, source }
    };

    fs::write(&partial, &bytes).await.map_err(io_error(&partial))?;
    fs::rename(&partial, target).await.map_err(io_error(target))?;

    ::log::debug!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

/// Whether `path` is a regular file with at least one byte
pub async fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeSession;
    use url::Url;

    fn media_ref(url: &str, name: &str) -> MediaRef {
        MediaRef {
            url: Url::parse(url).unwrap(),
            file_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_downloads_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.png"), b"cached").unwrap();

        let session = FakeSession::new("https://wiki.example.com/")
            .with_body("https://wiki.example.com/new.png", b"fresh")
            .with_body("https://wiki.example.com/old.png", b"remote");
        let media = vec![
            media_ref("https://wiki.example.com/new.png", "new.png"),
            media_ref("https://wiki.example.com/old.png", "old.png"),
        ];

        let stats = download_all(&session, &media, dir.path(), "home", false).await;
        assert_eq!(
            stats,
            MediaStats {
                downloaded: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(std::fs::read(dir.path().join("new.png")).unwrap(), b"fresh");
        assert_eq!(std::fs::read(dir.path().join("old.png")).unwrap(), b"cached");
        assert_eq!(session.requests(), vec!["https://wiki.example.com/new.png"]);
        assert!(!dir.path().join("new.png.part").exists());
    }

    #[tokio::test]
    async fn test_empty_file_is_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        let session = FakeSession::new("https://wiki.example.com/")
            .with_body("https://wiki.example.com/a.png", b"data");

        let media = vec![media_ref("https://wiki.example.com/a.png", "a.png")];
        let stats = download_all(&session, &media, dir.path(), "home", false).await;
        assert_eq!(stats.downloaded, 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let session = FakeSession::new("https://wiki.example.com/")
            .with_body("https://wiki.example.com/ok.png", b"ok");
        let media = vec![
            media_ref("https://wiki.example.com/missing.png", "missing.png"),
            media_ref("https://wiki.example.com/ok.png", "ok.png"),
        ];

        let stats = download_all(&session, &media, dir.path(), "home", false).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.downloaded, 1);
        assert!(!dir.path().join("missing.png").exists());
    }

    #[tokio::test]
    async fn test_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"old").unwrap();
        let session = FakeSession::new("https://wiki.example.com/")
            .with_body("https://wiki.example.com/a.png", b"new");

        let media = vec![media_ref("https://wiki.example.com/a.png", "a.png")];
        let stats = download_all(&session, &media, dir.path(), "home", true).await;
        assert_eq!(stats.downloaded, 1);
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"new");
    }
}
