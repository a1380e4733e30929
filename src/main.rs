use clap::Parser;
use std::process::ExitCode;
use wikijs_archiver::{Archiver, ScrapeConfig, logging, persist, report};

mod args;
use args::{Args, Command, FixArgs, ScrapeArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    match args.command.unwrap_or_default() {
        Command::Scrape(scrape_args) => scrape(scrape_args).await,
        Command::FixMediaPaths(fix_args) => fix_media_paths(fix_args),
    }
}

async fn scrape(args: ScrapeArgs) -> ExitCode {
    // Credentials are checked before any logging or network activity
    let mut config = match ScrapeConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    if let Err(e) = logging::init(&config.logs_dir) {
        eprintln!("error: could not set up logging in {}: {e}", config.logs_dir.display());
        return ExitCode::FAILURE;
    }

    ::log::info!(
        "Starting scrape for page={} user={}",
        config.login_url,
        config.user
    );
    println!("Note: logging in requires a WebDriver server (e.g. chromedriver or geckodriver).");
    println!("Set WEBDRIVER_URL if not using the default {}", config.webdriver_url);

    let start_time = std::time::Instant::now();
    let mut archiver = Archiver::new(config).with_force(args.force);

    match archiver.run().await {
        Ok(summary) => {
            print!("{}", report::render(&summary));
            ::log::info!(
                "Pipeline finished in {:.2} seconds, output at {}",
                start_time.elapsed().as_secs_f64(),
                archiver.config().output_dir().display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Scrape aborted in phase '{}': {}", archiver.phase(), e);
            ExitCode::FAILURE
        }
    }
}

fn fix_media_paths(args: FixArgs) -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = match args.dir {
        Some(dir) => dir,
        None => match ScrapeConfig::from_file(&args.config) {
            Ok(config) => config.output_dir(),
            Err(e) => {
                ::log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    if !dir.is_dir() {
        ::log::error!("Data directory not found: {}", dir.display());
        return ExitCode::FAILURE;
    }

    match persist::fix_media_paths(&dir) {
        Ok(stats) => {
            println!("{}/{} files patched", stats.patched, stats.total);
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
