use env_logger::{Builder, Env, Target, WriteStyle};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Module whose per-page progress lines always reach the log file
const PROGRESS_MODULE: &str = "wikijs_archiver::archiver";

/// Initialize logging to stdout and a timestamped file in `logs_dir`.
///
/// Honors `RUST_LOG`, defaulting to `info`. Per-page progress stays at `info`
/// unless `RUST_LOG` names the archiver module itself. Returns the path of the
/// log file.
pub fn init(logs_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(logs_dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = logs_dir.join(format!("scrape_{stamp}.log"));
    let file = File::create(&path)?;

    builder(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(Tee { file })))
        .write_style(WriteStyle::Never)
        .try_init()
        .map_err(io::Error::other)?;

    ::log::info!("Log file: {}", path.display());
    Ok(path)
}

fn builder(env: Env<'_>) -> Builder {
    let mut builder = Builder::new();
    builder.filter_module(PROGRESS_MODULE, LevelFilter::Info);
    builder.parse_env(env);
    builder
}

/// Writes every log record to stdout and the run's log file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    fn env(filter: &str) -> Env<'_> {
        Env::new()
            .filter("WIKIJS_ARCHIVER_UNSET_LOG_VAR")
            .default_filter_or(filter)
    }

    #[test]
    fn test_progress_survives_a_quieter_filter() {
        let logger = builder(env("warn")).build();
        assert!(enabled(&logger, PROGRESS_MODULE, Level::Info));
        assert!(!enabled(&logger, PROGRESS_MODULE, Level::Debug));
        assert!(!enabled(&logger, "wikijs_archiver::persist", Level::Info));
        assert!(enabled(&logger, "wikijs_archiver::persist", Level::Warn));
    }

    #[test]
    fn test_explicit_archiver_directive_wins() {
        let logger = builder(env("info,wikijs_archiver::archiver=debug")).build();
        assert!(enabled(&logger, PROGRESS_MODULE, Level::Debug));
    }
}
