mod commands;

use std::path::PathBuf;

use anyhow::Context;
use bridge_traits::logging::LogLevel;
use clap::{Parser, Subcommand};
use core_runtime::config::{AttachmentLookup, HostSettings, MirrorConfig};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::bootstrap_desktop;

#[derive(Parser)]
#[command(
    name = "catalog-mirror",
    about = "Mirror a Zotero library's PDFs into a vault folder tree",
    version
)]
struct Cli {
    /// Catalog API root (default: http://localhost:23119)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Zotero attachment storage (default: ~/Zotero/storage)
    #[arg(long, global = true)]
    storage: Option<String>,

    /// Vault root (default: current directory)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Library folder inside the vault (default: Library)
    #[arg(long, global = true)]
    library: Option<String>,

    /// Quiet period after a storage change before syncing
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Interval of the backstop poll
    #[arg(long, global = true)]
    poll_ms: Option<u64>,

    /// Fetch every attachment in one listing instead of per item
    #[arg(long, global = true)]
    prefetch: bool,

    /// JSON settings file (apiBaseUrl, zoteroStoragePath, libraryVaultPath, ...)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// pretty, compact or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync once, then keep watching until Ctrl-C
    Sync {
        /// Exit after the first pass
        #[arg(long)]
        once: bool,
    },

    /// Show the collection tree as it would be mirrored
    Tree {
        #[arg(long)]
        json: bool,
    },

    /// Search items by title, creator or year
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },

    /// Print the BibTeX entry of an item
    Bibtex { key: String },

    /// Verify the catalog is reachable
    Check,
}

impl Cli {
    fn mirror_config(&self) -> anyhow::Result<MirrorConfig> {
        let mut settings = match &self.settings {
            Some(path) => HostSettings::load(path)?,
            None => HostSettings::default(),
        };

        if let Some(api) = &self.api {
            settings.api_base_url = api.clone();
        }
        if let Some(storage) = &self.storage {
            settings.zotero_storage_path = storage.clone();
        }
        if let Some(library) = &self.library {
            settings.library_vault_path = library.clone();
        }
        if self.debounce_ms.is_some() {
            settings.debounce_ms = self.debounce_ms;
        }
        if self.poll_ms.is_some() {
            settings.poll_interval_ms = self.poll_ms;
        }
        if self.prefetch {
            settings.attachment_lookup = Some(AttachmentLookup::Prefetched);
        }

        let vault = match &self.vault {
            Some(vault) => vault.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };

        Ok(settings.to_builder().vault_root(vault).build()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format.unwrap_or_default())
            .with_level(level)
            .with_target(cli.verbose),
    )?;

    let config = cli.mirror_config()?;
    let core = bootstrap_desktop(config)?;

    match cli.command {
        Command::Sync { once } => commands::sync(&core, once).await,
        Command::Tree { json } => commands::tree(&core, json).await,
        Command::Search { query, json } => commands::search(&core, &query, json).await,
        Command::Bibtex { key } => commands::bibtex(&core, &key).await,
        Command::Check => commands::check(&core).await,
    }
}
