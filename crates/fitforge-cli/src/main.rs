mod config;
mod plan_cmd;
mod seed_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use fitforge_db::config::DbConfig;
use fitforge_db::pool;

use config::FitforgeConfig;

#[derive(Parser)]
#[command(name = "fitforge", about = "Fitness tracking API with a workout plan generator")]
struct Cli {
    /// Database URL (overrides FITFORGE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a fitforge config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Insert demo data (or clear all data)
    Seed {
        /// Seed even if users already exist
        #[arg(long)]
        force: bool,
        /// Delete all data instead of seeding
        #[arg(long)]
        clear: bool,
        /// Confirm a destructive --clear
        #[arg(long, requires = "clear")]
        yes: bool,
    },
    /// Workout plan tools
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Print a generated weekly schedule without saving it
    Preview {
        /// Goal label, e.g. "build muscle" or "run faster"
        #[arg(long)]
        goal: String,
        /// Training days per week (1-7)
        #[arg(long)]
        days_per_week: u8,
        /// Running days (0-7)
        #[arg(long, default_value_t = 0)]
        run_days: u8,
        /// Lifting days (0-7)
        #[arg(long, default_value_t = 0)]
        lift_days: u8,
    },
}

fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let jwt_secret = config::generate_jwt_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            jwt_secret: jwt_secret.clone(),
            token_expire_minutes: fitforge_core::auth::TokenConfig::DEFAULT_EXPIRE_MINUTES,
        },
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.jwt_secret = {}...{}", &jwt_secret[..8], &jwt_secret[56..]);
    println!();
    println!("Next: run `fitforge db-init` to create and migrate the database.");

    Ok(())
}

async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = FitforgeConfig::resolve(cli_db_url)?;

    println!("Initializing fitforge database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("fitforge db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = FitforgeConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState::new(db_pool.clone(), resolved.token_config);
            let result =
                serve_cmd::run_serve(state, &resolved.allowed_origins, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Seed { force, clear, yes } => {
            let resolved = FitforgeConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = seed_cmd::run_seed(&db_pool, force, clear, yes).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            plan_cmd::run_plan_command(command)?;
        }
    }

    Ok(())
}
