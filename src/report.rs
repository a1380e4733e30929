use crate::results::{PageStatus, RunSummary};
use std::fmt::Write;

/// Renders a finished run as a plain-text table followed by the totals
pub fn render(summary: &RunSummary) -> String {
    let width = summary
        .outcomes
        .iter()
        .map(|o| o.path.chars().count())
        .max()
        .unwrap_or(0)
        .max("PAGE".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:<9}  {:>5}  DETAIL", "PAGE", "STATUS", "MEDIA");
    for outcome in &summary.outcomes {
        let (status, detail) = match &outcome.status {
            PageStatus::Succeeded => ("ok", outcome.folder.display().to_string()),
            PageStatus::Skipped => ("skipped", outcome.folder.display().to_string()),
            PageStatus::Failed(reason) => ("failed", reason.clone()),
        };
        let media = if outcome.media_failed > 0 {
            format!("{}!{}", outcome.media_downloaded, outcome.media_failed)
        } else {
            outcome.media_downloaded.to_string()
        };
        let _ = writeln!(
            out,
            "{:<width$}  {:<9}  {:>5}  {}",
            outcome.path, status, media, detail
        );
    }
    let _ = writeln!(
        out,
        "{} pages: {} succeeded, {} skipped, {} failed; {} media downloaded, {} media failed",
        summary.total(),
        summary.succeeded(),
        summary.skipped(),
        summary.failed(),
        summary.media_downloaded(),
        summary.media_failed()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PageOutcome;
    use std::path::PathBuf;

    #[test]
    fn test_render_lists_pages_and_totals() {
        let mut summary = RunSummary::default();
        summary.push(PageOutcome {
            path: "home".to_string(),
            folder: PathBuf::from("data/w/home"),
            status: PageStatus::Succeeded,
            media_downloaded: 3,
            media_failed: 1,
        });
        summary.push(PageOutcome::failed("broken", PathBuf::from("data/w/broken"), "page has no content"));

        let text = render(&summary);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("home"));
        assert!(lines[1].contains("3!1"));
        assert!(lines[2].contains("failed"));
        assert!(lines[2].contains("page has no content"));
        assert_eq!(
            lines[3],
            "2 pages: 1 succeeded, 0 skipped, 1 failed; 3 media downloaded, 1 media failed"
        );
    }
}
