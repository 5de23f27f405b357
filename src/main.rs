use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grind_planner::api::state::AppState;
use grind_planner::calculate::{analyze, Analysis};
use grind_planner::catalog::{NewEgg, NewLevel, NewMob};
use grind_planner::config::AppConfig;
use grind_planner::format::{format_clock, format_duration, format_magnitude};
use grind_planner::models::{Catalog, Character};
use grind_planner::storage::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotStore, StorageConfig,
};
use grind_planner::sync::SyncService;

#[derive(Parser)]
#[command(name = "grind-planner")]
#[command(about = "Plan leveling and farming: time to kill, time to level, best mob to grind")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Serve a static front-end from this directory
        #[arg(long)]
        static_dir: Option<String>,

        /// Keep the catalog in memory only
        #[arg(long)]
        memory: bool,
    },

    /// Show time to kill / time to level for every mob and the best target
    Analyze {
        /// Damage per second (e.g. "6M")
        #[arg(long)]
        damage: String,

        /// Current level
        #[arg(long, default_value = "1")]
        level: String,

        /// XP already collected in this level (e.g. "3.5k")
        #[arg(long, default_value = "0")]
        xp: String,

        /// Index of the egg to price in kills (see `show`)
        #[arg(long)]
        egg: Option<usize>,
    },

    /// Add a mob to the catalog
    AddMob {
        #[arg(long)]
        name: String,

        #[arg(long)]
        life: String,

        #[arg(long)]
        trophies: String,

        /// XP per kill
        #[arg(long)]
        xp: String,

        #[arg(long, default_value = "0")]
        area: String,
    },

    /// Add an egg to the catalog
    AddEgg {
        #[arg(long)]
        name: String,

        /// Price in trophies (e.g. "1.5M")
        #[arg(long)]
        price: String,

        #[arg(long, default_value = "0")]
        area: String,
    },

    /// Add a level XP threshold to the catalog
    AddLevel {
        #[arg(long)]
        level: String,

        /// XP required to complete the level
        #[arg(long)]
        xp: String,
    },

    /// Print the stored catalog
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting grind-planner v{}", env!("CARGO_PKG_VERSION"));

    let file_store = || -> Arc<dyn SnapshotStore> {
        let storage = StorageConfig::new(config.data_dir.clone());
        Arc::new(FileSnapshotStore::for_config(&storage))
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            static_dir,
            memory,
        } => {
            let store: Arc<dyn SnapshotStore> = if memory {
                tracing::warn!("Using in-memory catalog, nothing will be persisted");
                Arc::new(MemorySnapshotStore::new())
            } else {
                file_store()
            };
            let sync = SyncService::new(store, config.sync.clone());

            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(dir) = static_dir {
                server.static_dir = Some(PathBuf::from(dir));
            }

            let app = grind_planner::api::build_router(AppState::new(sync), &server);
            let addr = format!("{}:{}", server.host, server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Analyze {
            damage,
            level,
            xp,
            egg,
        } => {
            let sync = SyncService::new(file_store(), config.sync.clone());
            let (catalog, _) = sync.load().await?;

            let selected_egg = match egg {
                Some(index) => Some(catalog.eggs.get(index).with_context(|| {
                    format!("No egg #{} (catalog has {})", index, catalog.eggs.len())
                })?),
                None => None,
            };

            let character = Character::from_input(&damage, &level, &xp);
            let analysis = analyze(&catalog, &character, selected_egg, chrono::Utc::now());
            print_analysis(&analysis);
        }
        Commands::AddMob {
            name,
            life,
            trophies,
            xp,
            area,
        } => {
            let sync = SyncService::new(file_store(), config.sync.clone());
            let input = NewMob {
                name,
                life,
                trophies,
                xp,
                area,
            };
            let (mob, version) = sync
                .update(|store| store.add_mob(input.clone()).cloned())
                .await?;
            println!(
                "Added mob '{}' (life {}, xp {}) - catalog v{}",
                mob.name,
                format_magnitude(mob.life),
                format_magnitude(mob.xp),
                version
            );
        }
        Commands::AddEgg { name, price, area } => {
            let sync = SyncService::new(file_store(), config.sync.clone());
            let input = NewEgg { name, price, area };
            let (egg, version) = sync
                .update(|store| store.add_egg(input.clone()).cloned())
                .await?;
            println!(
                "Added egg '{}' (price {}) - catalog v{}",
                egg.name, egg.price, version
            );
        }
        Commands::AddLevel { level, xp } => {
            let sync = SyncService::new(file_store(), config.sync.clone());
            let input = NewLevel {
                level,
                xp_required: xp,
            };
            let (threshold, version) = sync
                .update(|store| store.add_level(input.clone()).cloned())
                .await?;
            println!(
                "Added level {} (xp {}) - catalog v{}",
                threshold.level, threshold.xp_required, version
            );
        }
        Commands::Show => {
            let sync = SyncService::new(file_store(), config.sync.clone());
            let (catalog, version) = sync.load().await?;
            print_catalog(&catalog, version);
        }
    }

    Ok(())
}

fn print_catalog(catalog: &Catalog, version: u64) {
    println!("\n=== Catalog v{} ===", version);

    println!("\nMobs:");
    if catalog.mobs.is_empty() {
        println!("  (none)");
    }
    for mob in &catalog.mobs {
        println!(
            "  {} - life {}, trophies {}, xp {}, area {}",
            mob.name,
            format_magnitude(mob.life),
            format_magnitude(mob.trophies),
            format_magnitude(mob.xp),
            mob.area
        );
    }

    println!("\nEggs:");
    if catalog.eggs.is_empty() {
        println!("  (none)");
    }
    for (index, egg) in catalog.eggs.iter().enumerate() {
        println!(
            "  [{}] {} - price {}, area {}",
            index, egg.name, egg.price, egg.area
        );
    }

    println!("\nLevels:");
    if catalog.levels.is_empty() {
        println!("  (none)");
    }
    for level in &catalog.levels {
        println!("  {} - {} xp", level.level, level.xp_required);
    }
}

fn print_analysis(analysis: &Analysis) {
    println!("\n=== Character ===");
    println!("Damage:           {}", format_magnitude(analysis.character.damage));
    println!("Level:            {}", analysis.character.level);
    println!(
        "XP:               {} / {} ({} to go)",
        format_magnitude(analysis.character.collected_xp),
        format_magnitude(analysis.xp_required),
        format_magnitude(analysis.xp_needed)
    );

    println!("\n=== Mobs ===");
    if analysis.targets.is_empty() {
        println!("(no mobs in catalog)");
    }
    for target in &analysis.targets {
        let time_to_level = target.time_to_level.unwrap_or(f64::INFINITY);
        let egg_cost = target
            .egg_cost
            .map(|cost| cost.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("\n{} (area {})", target.name, target.area);
        println!("  Life:             {}", format_magnitude(target.life));
        println!("  Trophies:         {}", format_magnitude(target.trophies));
        println!("  XP per kill:      {}", format_magnitude(target.xp));
        println!("  Time to kill:     {}", format_duration(target.time_to_kill));
        println!("  Time to level:    {}", format_duration(time_to_level));
        println!("  Kills for 1 egg:  {}", egg_cost);
    }

    println!("\n=== Best target ===");
    match &analysis.best {
        Some(best) => {
            let finish = best
                .completes_at
                .map(|t| format_clock(&t.with_timezone(&chrono::Local)))
                .unwrap_or_else(|| "-".to_string());
            println!("Mob:              {}", best.name);
            println!("Time to level:    {}", format_duration(best.time_to_level));
            println!("Done at:          {}", finish);
            println!("Kills needed:     {}", format_magnitude(best.kills_needed));
            println!("Trophies:         {}", format_magnitude(best.trophies));
        }
        None => {
            println!("Done at:          -");
            println!("Kills needed:     -");
            println!("Trophies:         -");
        }
    }
}
