//! RexOS collections tool
//!
//! Scans the ROM directories, restores stored metadata and loads the
//! collection overlay, then lists, shows or edits collections. Unsaved
//! custom collections are written back on exit.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rexos_config::RexOSConfig;
use rexos_library::{
    Catalog, CollectionManager, GameDatabase, GameId, GameStore, RomScanner, ToggleOutcome,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rexos-collections")]
#[command(about = "Inspect and edit RexOS game collections", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the system config with user overrides)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// ROM root, overriding the configuration
    #[arg(long, global = true)]
    roms: Option<PathBuf>,

    /// Home directory used for `~/` paths in collection files
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top-level list of systems and collections
    List,
    /// Print the games of a collection
    Show {
        name: String,
    },
    /// Create an empty custom collection
    Create {
        name: String,
    },
    /// Add or remove a game; use "favorites" to flip the favorite flag
    Toggle {
        collection: String,
        path: String,
    },
    /// Show a collection in the top-level list
    Enable {
        name: String,
    },
    /// Hide a collection from the top-level list
    Disable {
        name: String,
    },
    /// Record a play session of a game
    Played {
        path: String,
        /// Session length in seconds
        #[arg(long, default_value_t = 0)]
        seconds: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RexOSConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => RexOSConfig::load_default().context("Failed to load configuration")?,
    };
    let home = match cli.home {
        Some(home) => home,
        None => dirs::home_dir().context("Could not determine home directory")?,
    };
    let roms = cli.roms.unwrap_or_else(|| config.library.roms_dir.clone());

    let mut store = scan(&config, &roms).await?;
    let db = open_database(&config.library.database)?;
    db.sync_store(&mut store)
        .context("Failed to restore stored metadata")?;
    db.prune_missing(&store)
        .context("Failed to prune stored games")?;
    info!("Database holds {} games", db.game_count()?);

    let mut manager = CollectionManager::from_config(config.collections.clone(), &home)
        .context("Failed to open collections directory")?;
    manager
        .load_collection_systems(&store)
        .context("Failed to load collections")?;

    let mut settings_changed = false;
    match cli.command {
        Commands::List => list(&manager, &store),
        Commands::Show { name } => show(&mut manager, &store, &name)?,
        Commands::Create { name } => {
            let created = manager.create_custom_collection(&name, &store)?;
            println!("Created collection {}", created);
            settings_changed = true;
        }
        Commands::Toggle { collection, path } => {
            toggle(&mut manager, &mut store, &db, &collection, &path)?;
        }
        Commands::Enable { name } => {
            manager.set_enabled(&name, true)?;
            manager.rebuild_display_list(&store)?;
            settings_changed = true;
        }
        Commands::Disable { name } => {
            manager.set_enabled(&name, false)?;
            manager.rebuild_display_list(&store)?;
            settings_changed = true;
        }
        Commands::Played { path, seconds } => {
            played(&mut manager, &mut store, &db, &path, seconds)?;
        }
    }

    for event in manager.drain_events() {
        tracing::debug!("{:?}", event);
    }

    if settings_changed {
        let mut updated = config.clone();
        updated.collections = manager.config().clone();
        match &cli.config {
            Some(path) => updated.save(path)?,
            None => updated.save_default()?,
        }
    }

    manager.shutdown(&store).context("Failed to save collections")?;
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(false))
        .init();
}

async fn scan(config: &RexOSConfig, roms: &Path) -> Result<GameStore> {
    let scanner = RomScanner::new();
    let library = config.library.clone();
    let (store, result) = scanner
        .scan_into_store(roms, |system| library.is_game_system(system))
        .await
        .with_context(|| format!("Failed to scan {}", roms.display()))?;
    if !result.errors.is_empty() {
        warn!("{} systems could not be scanned", result.errors.len());
    }
    Ok(store)
}

fn open_database(path: &Path) -> Result<GameDatabase> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    GameDatabase::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn list(manager: &CollectionManager, store: &GameStore) {
    for catalog in manager.display_list() {
        let count = match catalog {
            Catalog::System(name) => store.system(name).map_or(0, |s| s.games_recursive().len()),
            Catalog::Collection(name) => manager.get(name).map_or(0, |c| c.len()),
            Catalog::Bundle => manager.bundle_games().len(),
        };
        let kind = match catalog {
            Catalog::System(_) => "system",
            Catalog::Collection(_) => "collection",
            Catalog::Bundle => "bundle",
        };
        println!("{:<10} {:<32} {:>6}", kind, manager.display_name(catalog, store), count);
    }

    let hidden: Vec<&str> = manager
        .custom_collections()
        .chain(manager.auto_collections())
        .filter(|c| !c.is_enabled())
        .map(|c| c.name())
        .collect();
    if !hidden.is_empty() {
        println!("\nDisabled: {}", hidden.join(", "));
    }
}

fn show(manager: &mut CollectionManager, store: &GameStore, name: &str) -> Result<()> {
    let collection = manager.collection(name, store)?;
    println!("{} ({} games)", collection.decl().display_name, collection.len());
    if collection.decl().is_custom() {
        println!("{}", collection.folder_metadata().description);
    }
    println!();
    for id in collection.games() {
        if let Some(game) = store.get(id) {
            println!("{:<40} {}", game.name, game.path);
        }
    }
    Ok(())
}

fn toggle(
    manager: &mut CollectionManager,
    store: &mut GameStore,
    db: &GameDatabase,
    collection: &str,
    path: &str,
) -> Result<()> {
    let id = find_game(store, path)?;

    let favorites = collection == "favorites";
    if !favorites {
        manager.set_edit_mode(collection, store)?;
    }
    let outcome = manager.toggle_membership(store, id)?;

    if favorites && let Some(game) = store.get(id) {
        db.set_favorite(&game.path, game.favorite)
            .context("Failed to store favorite")?;
    }
    manager.exit_edit_mode(store)?;

    match outcome {
        ToggleOutcome::Added { collection } => info!("Added {} to {}", path, collection),
        ToggleOutcome::Removed { collection } => info!("Removed {} from {}", path, collection),
    }
    Ok(())
}

fn played(
    manager: &mut CollectionManager,
    store: &mut GameStore,
    db: &GameDatabase,
    path: &str,
    seconds: i64,
) -> Result<()> {
    let id = find_game(store, path)?;
    let Some(game) = store.get_mut(id) else {
        bail!("{} is not in the game library", path);
    };
    let stats = db
        .update_play_stats(&game.path, seconds)
        .context("Failed to store play statistics")?;
    game.play_count = stats.play_count;
    game.last_played = stats.last_played;
    manager.on_game_changed(store, id);
    info!("{} played {} times", path, stats.play_count);
    Ok(())
}

fn find_game(store: &GameStore, path: &str) -> Result<GameId> {
    let found = store.find_by_path(path).or_else(|| {
        let canonical = std::fs::canonicalize(path).ok()?;
        store.find_by_path(&canonical.to_string_lossy())
    });
    match found {
        Some(id) => Ok(id),
        None => bail!("{} is not in the game library", path),
    }
}
