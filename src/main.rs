use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use xfeed::config::Config;
use xfeed::feed::{self, FaviconLookup, FeedClient};
use xfeed::normalize::NormalizedItem;

/// Maximum size of a local feed file accepted by `normalize`.
const MAX_LOCAL_FEED_SIZE: u64 = 10 * 1024 * 1024;

/// Get the config file path (~/.config/xfeed/config.toml)
fn get_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("xfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "xfeed", about = "Normalized posts from xcancel.com feeds")]
struct Args {
    /// Config file (default: ~/.config/xfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Mirror site base URL, overriding the config file
    #[arg(long, value_name = "URL", global = true)]
    site: Option<String>,

    /// Drop reposts from the output
    #[arg(long, global = true)]
    no_reposts: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch accounts and print their posts as JSON
    Load {
        /// Account handles; the configured list when omitted
        handles: Vec<String>,
    },
    /// Print the name, icon and site of an account's feed
    Verify { handle: String },
    /// Normalize a local feed file without touching the network
    Normalize { file: PathBuf },
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(site) = &args.site {
        config.site = site.clone();
    }
    if args.no_reposts {
        config.include_reposts = false;
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

async fn load(config: &Config, handles: Vec<String>) -> Result<()> {
    let handles = if handles.is_empty() {
        config.handles.clone()
    } else {
        handles
    };
    if handles.is_empty() {
        anyhow::bail!("No handles given and none configured");
    }

    let client = FeedClient::new(&config.user_agent, config.timeout())
        .context("Failed to create HTTP client")?;
    let urls = handles
        .iter()
        .map(|handle| feed::feed_url(&config.site, handle))
        .collect();

    let results = feed::load_all(&client, urls, &config.options()).await;
    let total = results.len();
    let mut failed = 0;
    let mut items: Vec<NormalizedItem> = Vec::new();
    for result in results {
        match result.result {
            Ok(mut loaded) => items.append(&mut loaded),
            Err(e) => {
                failed += 1;
                eprintln!("Warning: {}: {}", result.url, e);
            }
        }
    }
    if failed == total {
        anyhow::bail!("All {} feeds failed to load", total);
    }

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    print_json(&items)
}

async fn verify(config: &Config, handle: &str) -> Result<()> {
    let client = FeedClient::new(&config.user_agent, config.timeout())
        .context("Failed to create HTTP client")?;
    let url = feed::feed_url(&config.site, handle);
    let verification = client
        .verify(&url, &FaviconLookup)
        .await
        .with_context(|| format!("Failed to verify {url}"))?;
    print_json(&verification)
}

fn normalize_file(config: &Config, file: &Path) -> Result<()> {
    let metadata = std::fs::metadata(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", file.display());
    }
    if metadata.len() > MAX_LOCAL_FEED_SIZE {
        anyhow::bail!("{} is larger than {} bytes", file.display(), MAX_LOCAL_FEED_SIZE);
    }

    let xml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let items = feed::normalize_xml(&xml, &config.options())
        .with_context(|| format!("Failed to decode {}", file.display()))?;
    tracing::info!(file = %file.display(), items = items.len(), "Normalized local feed");
    print_json(&items)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::Load { handles } => load(&config, handles).await,
        Command::Verify { handle } => verify(&config, &handle).await,
        Command::Normalize { file } => normalize_file(&config, &file),
    }
}
