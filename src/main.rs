use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use glance::app::{App, AppEvent};
use glance::config::Config;
use glance::nav::{NavEvent, Selection};
use glance::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/glance/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("glance");
    Ok(config_dir)
}

/// Create the config directory with user-only access.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to set permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }
    Ok(())
}

/// Install the tracing subscriber. The terminal is in raw mode while the
/// UI runs, so logs go to a file. Filter with `RUST_LOG`.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("glance.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "glance", about = "Keyboard-driven reader for a local feed database")]
struct Args {
    /// Database file (default: ~/.config/glance/glance.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Config file (default: ~/.config/glance/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show only this feed; repeat for several (default: every feed)
    #[arg(long = "feed", value_name = "URL")]
    feeds: Vec<String>,

    /// Show only feeds in this category
    #[arg(long, value_name = "NAME", conflicts_with = "feeds")]
    category: Option<String>,

    /// Show only articles carrying this tag
    #[arg(long, value_name = "ID")]
    tag: Option<i64>,
}

/// Resolve the selection named on the command line. Unknown categories
/// and tags are rejected.
async fn resolve_selection(db: &Database, args: &Args) -> Result<Selection> {
    let selection = match (args.feeds.as_slice(), &args.category) {
        ([url], _) => Selection::feed(url.clone()),
        ([], Some(category)) => {
            let known = db.categories().await.context("Failed to load categories")?;
            if !known.iter().any(|c| c == category) {
                anyhow::bail!(
                    "Unknown category '{}' (known: {})",
                    category,
                    known.join(", ")
                );
            }
            let urls = db
                .feed_urls(Some(category))
                .await
                .context("Failed to load category feeds")?;
            Selection::category(category, urls)
        }
        ([], None) => {
            let urls = db.feed_urls(None).await.context("Failed to load feeds")?;
            Selection::category("All feeds", urls)
        }
        (urls, _) => Selection::category("Selected feeds", urls.iter().cloned()),
    };

    if let Some(tag_id) = args.tag {
        let tags = db.get_tags().await.context("Failed to load tags")?;
        let tag = tags
            .iter()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown tag id {}", tag_id))?;
        tracing::debug!(tag_id, tag = %tag.name, "Filtering by tag");
    }
    Ok(selection.with_tag(args.tag))
}

/// Log what the database holds before the UI takes over the terminal.
async fn log_library_summary(db: &Database) {
    match db.get_feeds_with_unread_counts().await {
        Ok(feeds) => {
            let unread: i64 = feeds.iter().map(|f| f.unread_count).sum();
            tracing::info!(feeds = feeds.len(), unread, "Library loaded");
        }
        Err(e) => tracing::warn!(error = %e, "Failed to summarize library"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args.db.clone().unwrap_or_else(|| config_dir.join("glance.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of glance appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    log_library_summary(&db).await;
    let selection = resolve_selection(&db, &args).await?;
    tracing::info!(
        selection = %selection.label,
        feeds = selection.feed_urls.len(),
        tag_id = ?selection.tag_id,
        "Starting"
    );

    // Navigation results and front-end events travel on separate channels
    let (nav_tx, nav_rx) = mpsc::channel::<NavEvent>(64);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    let mut app = App::new(db, &config, selection, nav_tx, event_tx.clone());
    app.nav.start();

    glance::ui::run(&mut app, event_tx, event_rx, nav_rx).await?;

    println!("Goodbye!");
    Ok(())
}
