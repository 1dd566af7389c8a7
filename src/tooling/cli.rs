//! CLI Tooling
//!
//! Command-line front end over the catalog pipeline. Every command opens the
//! configured store, does its work and returns the text to print.

use crate::builder::{CatalogBuilder, CatalogContext, RefreshLevel};
use crate::config::DiscdexConfig;
use crate::error::ApiError;
use crate::extract::HeaderExtractor;
use crate::logging::LoggingConfig;
use crate::progress::{LogProgress, ProgressSink};
use crate::roots::{self, GAME_DIRECTORIES_KEY};
use crate::store::{SledCatalogStore, SledPreferenceStore};
use crate::sync::{HttpStatusSource, StatusSyncer};
use crate::tooling::format;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use tracing::info;

/// discdex - disc image game catalog
#[derive(Parser)]
#[command(name = "discdex")]
#[command(about = "Catalog disc image game libraries and sync remote title metadata")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync remote status, then scan every game root into the catalog
    Build {
        /// Refresh level: status-only (0) or rebuild (3)
        #[arg(long, default_value = "rebuild")]
        level: RefreshLevel,
        /// Print each newly cataloged title to stderr
        #[arg(long)]
        progress: bool,
    },
    /// Pull remote status updates without scanning
    Sync,
    /// List cataloged titles
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Manage scan roots
    Roots {
        #[command(subcommand)]
        command: RootsCommands,
    },
    /// Storage layout commands
    Layout {
        #[command(subcommand)]
        command: LayoutCommands,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand)]
pub enum RootsCommands {
    /// Show the roots the next build will scan
    List,
    /// Add a scan root
    Add { path: String },
    /// Remove a scan root
    Remove { path: String },
}

#[derive(Subcommand)]
pub enum LayoutCommands {
    /// Create every storage subdirectory
    Init,
    /// Show storage paths and BIOS/backup memory files
    Show,
}

/// Opened store and resolved collaborators for one CLI invocation
pub struct CliContext {
    config: DiscdexConfig,
    catalog: CatalogContext,
    store_path: PathBuf,
}

impl CliContext {
    /// Open the configured store and wire up the collaborators.
    pub fn from_config(config: DiscdexConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_store_path()?;
        std::fs::create_dir_all(&store_path)
            .map_err(|e| ApiError::StorageError(crate::error::StorageError::IoError(e)))?;
        let db = sled::open(&store_path).map_err(crate::error::StorageError::from)?;

        let store = Arc::new(SledCatalogStore::from_db(db.clone())?);
        let preferences = Arc::new(SledPreferenceStore::from_db(&db)?);
        let status_source = Arc::new(HttpStatusSource::new(config.remote.endpoint())?);

        let catalog = CatalogContext {
            layout: config.storage.layout()?,
            store,
            preferences,
            extractor: Arc::new(HeaderExtractor::new()),
            status_source,
            malformed_policy: config.remote.malformed_policy,
            progress: Arc::new(LogProgress),
        };

        info!("Opened catalog at {}", store_path.display());
        Ok(Self {
            config,
            catalog,
            store_path,
        })
    }

    pub fn catalog(&self) -> &CatalogContext {
        &self.catalog
    }

    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Build { level, progress } => self.build(*level, *progress),
            Commands::Sync => {
                let report = StatusSyncer::new(
                    self.catalog.store.as_ref(),
                    self.catalog.status_source.as_ref(),
                )
                .with_policy(self.catalog.malformed_policy)
                .sync()?;
                Ok(format!(
                    "{}\n{}",
                    format::format_section_heading("Status sync"),
                    format::format_sync_report(&report)
                ))
            }
            Commands::List { format: output } => {
                let entries = self.catalog.store.entries()?;
                match output.as_str() {
                    "json" => format::format_entries_json(&entries).map_err(|e| {
                        ApiError::ConfigError(format!("Failed to render catalog: {}", e))
                    }),
                    "text" => Ok(format::format_entries_text(&entries)),
                    other => Err(ApiError::ConfigError(format!(
                        "Invalid output format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
            Commands::Roots { command } => self.roots(command),
            Commands::Layout { command } => self.layout(command),
            Commands::Config => self
                .config
                .to_toml()
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn build(&self, level: RefreshLevel, show_progress: bool) -> Result<String, ApiError> {
        if !show_progress {
            let report = CatalogBuilder::new(&self.catalog).build(level)?;
            return Ok(format::format_build_report(&report));
        }

        let (tx, rx) = mpsc::channel::<String>();
        let printer = std::thread::spawn(move || {
            for title in rx {
                eprintln!("  + {}", title);
            }
        });

        let mut context = self.catalog.clone();
        context.progress = Arc::new(tx) as Arc<dyn ProgressSink>;
        let result = CatalogBuilder::new(&context).build(level);
        // Closing the channel ends the printer
        drop(context);
        let _ = printer.join();

        Ok(format::format_build_report(&result?))
    }

    fn persisted_roots(&self) -> Result<Option<String>, ApiError> {
        Ok(self.catalog.preferences.get(GAME_DIRECTORIES_KEY)?)
    }

    fn roots(&self, command: &RootsCommands) -> Result<String, ApiError> {
        let persisted = self.persisted_roots()?;
        match command {
            RootsCommands::List => {
                let games = self.catalog.layout.games_path()?;
                let external = self.catalog.layout.external_games_path();
                let resolution =
                    roots::resolve(persisted.as_deref(), &games, external.as_deref());
                Ok(format::format_roots(&resolution.roots, persisted.as_deref()))
            }
            RootsCommands::Add { path } => {
                let value = roots::add_root(persisted.as_deref(), path);
                self.catalog.preferences.set(GAME_DIRECTORIES_KEY, &value)?;
                Ok(format!("Added scan root {}\nPersisted: {}", path, value))
            }
            RootsCommands::Remove { path } => {
                let value = roots::remove_root(persisted.as_deref(), path);
                self.catalog.preferences.set(GAME_DIRECTORIES_KEY, &value)?;
                Ok(format!("Removed scan root {}\nPersisted: {}", path, value))
            }
        }
    }

    fn layout(&self, command: &LayoutCommands) -> Result<String, ApiError> {
        let layout = &self.catalog.layout;
        match command {
            LayoutCommands::Init => {
                layout.init_all()?;
                Ok(format!("Initialized storage layout at {}", layout.root_path()?))
            }
            LayoutCommands::Show => {
                let bios = layout.bios_files()?;
                let memory = layout.memory_files()?;
                Ok(format::format_layout(layout, &bios, &memory))
            }
        }
    }
}
