//! gdpull binary — list Drive files matching a pattern, confirm, download.

use clap::Parser;
use gdpull::{Authenticator, Config, DriveClient, FileStore, confirm_download};
use regex::Regex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Download Google Drive files whose names match a regular expression
#[derive(Debug, Parser)]
#[command(name = "gdpull", version, about)]
struct Cli {
    /// Regular expression applied to remote file names
    pattern: String,

    /// Directory downloaded files are written into
    #[arg(long, value_name = "DIR")]
    output_dir: Option<std::path::PathBuf>,

    /// Maximum number of concurrent downloads
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gdpull=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "gdpull failed");
        eprintln!("gdpull error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> gdpull::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(output_dir) = cli.output_dir {
        config.download.download_dir = output_dir;
    }
    if let Some(concurrency) = cli.concurrency {
        config.download.max_concurrent_downloads = concurrency;
    }
    config.validate()?;

    let filter = Regex::new(&cli.pattern)?;

    let auth = Authenticator::new(config.auth.clone());
    let token = auth.access_token().await?;
    let store: Arc<dyn FileStore> =
        Arc::new(DriveClient::new(token, config.download.page_size));

    let matches = gdpull::list_matching(store.as_ref(), &filter).await?;
    if matches.is_empty() {
        println!("No such files");
        return Ok(());
    }

    println!("Found files ({}):", matches.len());
    for (number, (_, name)) in matches.iter().enumerate() {
        println!("{}. {}", number + 1, name);
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    if !confirm_download(&mut stdin.lock(), &mut stdout)? {
        return Ok(());
    }

    tokio::fs::create_dir_all(&config.download.download_dir).await?;
    let outcomes = gdpull::download_all(
        store,
        &matches,
        &config.download.download_dir,
        config.download.max_concurrent_downloads,
    )
    .await;

    for outcome in outcomes.iter().filter(|o| !o.kind.is_success()) {
        tracing::warn!(name = %outcome.name, kind = %outcome.kind, "download failed");
    }
    Ok(())
}
