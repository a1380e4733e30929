use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wikijs_archiver::ScrapeConfig;

#[derive(Parser, Debug)]
#[command(name = "wikijs-archiver")]
#[command(about = "Archives the pages and media of a wiki.js instance")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in, discover all pages and save their HTML and media (default)
    Scrape(ScrapeArgs),

    /// Point media references in already saved HTML at the local media folders
    FixMediaPaths(FixArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Scrape(ScrapeArgs::default())
    }
}

#[derive(clap::Args, Debug)]
pub struct ScrapeArgs {
    /// Credentials file with `page`, `user` and `password`
    #[arg(short, long, default_value = ".env")]
    pub config: PathBuf,

    /// Overwrite existing files and re-fetch pages that are already complete
    #[arg(short, long)]
    pub force: bool,

    /// Root of the archived output
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Name of the wiki's folder under the data directory
    #[arg(long)]
    pub wiki_name: Option<String>,

    /// WebDriver server to drive the login browser
    #[arg(long)]
    pub webdriver_url: Option<String>,
}

impl Default for ScrapeArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(".env"),
            force: false,
            data_dir: None,
            wiki_name: None,
            webdriver_url: None,
        }
    }
}

impl ScrapeArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(name) = &self.wiki_name {
            config.wiki_name = wikijs_archiver::utils::sanitize_filename(name);
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct FixArgs {
    /// Wiki output folder to patch (defaults to the one named by the config file)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Credentials file used to locate the output folder
    #[arg(short, long, default_value = ".env")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_scrape() {
        let args = Args::parse_from(["wikijs-archiver"]);
        assert!(args.command.is_none());
        assert!(matches!(Command::default(), Command::Scrape(a) if a.config == PathBuf::from(".env")));
    }

    #[test]
    fn test_scrape_flags() {
        let args = Args::parse_from([
            "wikijs-archiver",
            "scrape",
            "--force",
            "--data-dir",
            "/tmp/out",
            "--wiki-name",
            "IMI Wiki",
        ]);
        let Some(Command::Scrape(scrape)) = args.command else {
            panic!("expected scrape");
        };
        assert!(scrape.force);

        let mut config = ScrapeConfig::from_pairs([
            ("page", "https://wiki.example.com/login"),
            ("user", "alice"),
            ("password", "s3cret"),
        ])
        .unwrap();
        scrape.apply(&mut config);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out/IMI_Wiki"));
    }

    #[test]
    fn test_fix_media_paths_subcommand() {
        let args = Args::parse_from(["wikijs-archiver", "fix-media-paths", "--dir", "data/w"]);
        assert!(matches!(
            args.command,
            Some(Command::FixMediaPaths(FixArgs { dir: Some(_), .. }))
        ));
    }
}
