//! On-disk layout of the archive.
//!
//! ```text
//! data/<wiki-name>/<page-slug>/index.html
//! data/<wiki-name>/<page-slug>/media/<file>
//! data/<wiki-name>/<page-slug>/page.json
//! ```
//!
//! `page.json` is written last; a folder whose manifest lists only media that
//! exist on disk is complete and is skipped on the next run.

use crate::error::PersistError;
use crate::media::{self, MediaStats};
use crate::parsers::media::rewrite_media_refs;
use crate::results::{PageDescriptor, PageRecord};
use crate::session::WikiSession;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "index.html";
pub const MANIFEST_FILE: &str = "page.json";
pub const MEDIA_DIR: &str = "media";

/// Assigns each page a folder under the wiki's output directory.
///
/// Names come from the page path; a name already handed out in this run
/// (compared case-insensitively) gets `-2`, `-3`, ... appended.
pub struct FolderAllocator {
    root: PathBuf,
    taken: HashSet<String>,
}

impl FolderAllocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            taken: HashSet::new(),
        }
    }

    pub fn allocate(&mut self, page: &PageDescriptor) -> PathBuf {
        let base = utils::sanitize_filename(&page.path);
        let mut name = base.clone();
        let mut n = 2;
        while !self.taken.insert(name.to_lowercase()) {
            name = format!("{base}-{n}");
            n += 1;
        }
        self.root.join(name)
    }
}

/// Record of a saved page, written after everything else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub page: PageDescriptor,
    pub media: Vec<String>,
}

impl Manifest {
    /// Whether this manifest was written for `page`
    pub fn describes(&self, page: &PageDescriptor) -> bool {
        self.page.path == page.path && self.page.locale == page.locale && self.page.id == page.id
    }
}

/// Whether a page folder holds a non-empty index, a manifest written for
/// `page` and every media file that manifest lists
pub async fn is_complete(folder: &Path, page: &PageDescriptor) -> bool {
    if !media::is_nonempty_file(&folder.join(INDEX_FILE)).await {
        return false;
    }
    let manifest = match read_manifest(folder).await {
        Some(manifest) if manifest.describes(page) => manifest,
        _ => return false,
    };
    let media_dir = folder.join(MEDIA_DIR);
    for name in &manifest.media {
        if !media::is_nonempty_file(&media_dir.join(name)).await {
            return false;
        }
    }
    true
}

async fn read_manifest(folder: &Path) -> Option<Manifest> {
    let raw = fs::read(folder.join(MANIFEST_FILE)).await.ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Writes a fetched page into `folder` and downloads its media.
///
/// `index.html` is kept if it already exists and is non-empty, unless `force`
/// or the folder's manifest belongs to a different page.
pub async fn save_page<S>(
    session: &S,
    record: &PageRecord,
    folder: &Path,
    force: bool,
) -> Result<MediaStats, PersistError>
where
    S: WikiSession + ?Sized,
{
    let media_dir = folder.join(MEDIA_DIR);
    fs::create_dir_all(&media_dir)
        .await
        .map_err(|source| PersistError::Io {
            path: media_dir.clone(),
            source,
        })?;

    let index = folder.join(INDEX_FILE);
    let foreign = read_manifest(folder)
        .await
        .is_some_and(|manifest| !manifest.describes(&record.descriptor));
    if foreign {
        ::log::info!(
            "Folder {} held another page, replacing it with {}",
            folder.display(),
            record.descriptor.path
        );
    }
    if force || foreign || !media::is_nonempty_file(&index).await {
        let html = localize_media(record, session.base_url());
        let document = wrap_document(&record.descriptor, &html);
        write_file(&index, document.as_bytes()).await?;
        ::log::info!("Saved HTML to {}", index.display());
    } else {
        ::log::debug!("Keeping existing {}", index.display());
    }

    let path = &record.descriptor.path;
    let stats = media::download_all(session, &record.media, &media_dir, path, force).await;

    let manifest = Manifest {
        page: record.descriptor.clone(),
        media: record.media.iter().map(|m| m.file_name.clone()).collect(),
    };
    let encoded = serde_json::to_vec_pretty(&manifest)?;
    write_file(&folder.join(MANIFEST_FILE), &encoded).await?;

    Ok(stats)
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    fs::write(path, contents)
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Points the page's media references at `media/<file>`
fn localize_media(record: &PageRecord, base: &url::Url) -> String {
    let local: HashMap<&str, &str> = record
        .media
        .iter()
        .map(|m| (m.url.as_str(), m.file_name.as_str()))
        .collect();

    rewrite_media_refs(&record.html, |value| {
        let mut url = base.join(value.trim()).ok()?;
        url.set_fragment(None);
        local
            .get(url.as_str())
            .map(|name| format!("{MEDIA_DIR}/{name}"))
    })
}

/// Wraps content HTML in a standalone document; full documents pass through
pub fn wrap_document(page: &PageDescriptor, html: &str) -> String {
    let head = html
        .trim_start()
        .chars()
        .take(15)
        .collect::<String>()
        .to_ascii_lowercase();
    if head.starts_with("<!doctype") || head.starts_with("<html") {
        return html.to_string();
    }

    let lang = page.locale.as_deref().unwrap_or("en");
    format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(lang),
        escape_text(&page.title),
        html
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Rewrites `src`/`href` values whose file already exists in `media_dir` to `media/<file>`.
///
/// References to files that are not in `media_dir` are left untouched.
pub fn rewrite_media_paths(html: &str, media_dir: &Path) -> String {
    rewrite_media_refs(html, |value| {
        let name = local_media_name(value)?;
        media_dir
            .join(&name)
            .is_file()
            .then(|| format!("{MEDIA_DIR}/{name}"))
    })
}

/// Sanitized, percent-decoded last path segment of a reference
fn local_media_name(value: &str) -> Option<String> {
    let path = value.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().filter(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(utils::sanitize_filename(&decoded))
}

/// Counts from a `fix_media_paths` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixStats {
    pub patched: usize,
    pub total: usize,
}

/// Rewrites media references in every HTML file below `root` that has a sibling `media/` folder
pub fn fix_media_paths(root: &Path) -> Result<FixStats, PersistError> {
    let mut html_files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
        .collect();
    html_files.sort();

    ::log::info!("Found {} HTML files to patch", html_files.len());
    let mut stats = FixStats {
        total: html_files.len(),
        ..FixStats::default()
    };

    for html_path in &html_files {
        let Some(media_dir) = html_path.parent().map(|p| p.join(MEDIA_DIR)) else {
            continue;
        };
        if !media_dir.is_dir() {
            continue;
        }

        let io_error = |source| PersistError::Io {
            path: html_path.clone(),
            source,
        };
        let original = std::fs::read_to_string(html_path).map_err(io_error)?;
        let rewritten = rewrite_media_paths(&original, &media_dir);
        if rewritten != original {
            std::fs::write(html_path, rewritten).map_err(io_error)?;
            stats.patched += 1;
            ::log::info!("Patched: {}", html_path.display());
        }
    }

    ::log::info!("Done: {}/{} files patched", stats.patched, stats.total);
    Ok(stats)
}
