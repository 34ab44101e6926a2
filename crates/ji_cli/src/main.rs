use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ji_core::{RecordKind, SiteConfig};
use ji_scrapers::{handle_command, init_logging, HumanDuration, ScraperCommands, ScraperManager};
use ji_web::AppState;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "ji.toml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrapes news, courses and trainers from the institute website", long_about = None)]
pub struct Cli {
    /// Storage backend: memory, or sqlite when built with the sqlite feature
    #[arg(long, global = true, default_value = "memory")]
    storage: String,
    /// Backend specific location, e.g. the SQLite database path
    #[arg(long, global = true)]
    backend_url: Option<String>,
    /// TOML site configuration. Defaults are used when the file is missing.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Pause after each item, for every pipeline (e.g. 500ms)
    #[arg(long, global = true)]
    item_delay: Option<HumanDuration>,
    /// Pause between listing pages, for every pipeline (e.g. 2s)
    #[arg(long, global = true)]
    page_delay: Option<HumanDuration>,
    /// Listing page cap, for every pipeline
    #[arg(long, global = true)]
    max_pages: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,
    },
    #[command(flatten)]
    Scraper(ScraperCommands),
}

impl Cli {
    /// The configuration file with command line overrides applied.
    fn site_config(&self) -> anyhow::Result<SiteConfig> {
        let mut config = if self.config.exists() {
            SiteConfig::load_or_default(&self.config)
        } else {
            info!("No config file at {}, using defaults", self.config.display());
            SiteConfig::default()
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        for kind in RecordKind::ALL {
            let pipeline = config.pipeline_mut(kind);
            if let Some(HumanDuration(delay)) = self.item_delay {
                pipeline.item_delay_ms = delay.as_millis() as u64;
            }
            if let Some(HumanDuration(delay)) = self.page_delay {
                pipeline.page_delay_ms = delay.as_millis() as u64;
            }
            if let Some(max_pages) = self.max_pages {
                pipeline.max_pages = Some(max_pages);
            }
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = cli.site_config()?;
    let storage = ji_storage::create_storage(&cli.storage, cli.backend_url.as_deref()).await?;
    info!("Storage initialized (using {})", cli.storage);

    let manager = ScraperManager::new(storage, config)?;
    info!("Scraping {}", manager.config().base());

    match cli.command {
        Commands::Serve { bind } => {
            let app = ji_web::create_app(AppState::new(Arc::new(manager)));
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {}", bind))?;
            info!("Listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::Scraper(command) => handle_command(command, &manager).await?,
    }

    Ok(())
}
