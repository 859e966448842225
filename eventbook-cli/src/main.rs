//! eventbook - runs the event booking widget server
//!
//! - `serve`: HTTP server with the booking widget and submit action
//! - `migrate`: create the bookings table ahead of the first booking

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventbook_server::analytics::{
    drain as drain_analytics, PosthogAnalytics, SharedAnalytics, TracingAnalytics,
};
use eventbook_server::config::{connect_timeout_from_secs, AnalyticsConfig, DatabaseConfig};
use eventbook_server::db::{self, ConnectionManager, Connector, MemoryConnector, PgConnector};
use eventbook_server::http::{run_server, AppState, ServerConfig};
use eventbook_server::BookingWriter;

/// Placeholder connection string for `serve --memory`
const MEMORY_URI: &str = "memory://local";

/// How long queued analytics may take to flush after the server stops
const ANALYTICS_DRAIN_LIMIT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "eventbook", version, about = "Event booking widget server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Create the bookings table and exit
    Migrate(DatabaseArgs),
}

/// Database options shared by every subcommand
#[derive(Parser, Debug)]
struct DatabaseArgs {
    /// Database URL (overrides DATABASE_URL / MONGODB_URI)
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum pooled connections (overrides EVENTBOOK_MAX_CONNECTIONS)
    #[arg(long)]
    max_connections: Option<u32>,

    /// Give up on a connection attempt after this many seconds
    /// (overrides EVENTBOOK_CONNECT_TIMEOUT_SECS; 0 or unset: wait)
    #[arg(long)]
    connect_timeout_secs: Option<u64>,
}

impl DatabaseArgs {
    fn into_config(self) -> DatabaseConfig {
        let mut config = DatabaseConfig::from_env();
        if let Some(url) = self.database_url {
            config.url = Some(url);
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = connect_timeout_from_secs(secs);
        }
        config
    }
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "EVENTBOOK_BIND", default_value = "127.0.0.1:3030")]
    bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    cors_permissive: bool,

    /// Keep bookings in memory instead of a database (development only)
    #[arg(long)]
    memory: bool,

    #[command(flatten)]
    database: DatabaseArgs,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Migrate(args) => run_migrate(args).await?,
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut db_config = args.database.into_config();

    let connector: Arc<dyn Connector> = if args.memory {
        info!("Using in-memory booking store; bookings are lost on exit");
        db_config.url.get_or_insert_with(|| MEMORY_URI.to_string());
        Arc::new(MemoryConnector::default())
    } else {
        Arc::new(PgConnector::new(db_config.max_connections))
    };

    if db_config.url.is_none() {
        // Reported per booking once the first connection is needed
        tracing::warn!("DATABASE_URL is not set; bookings will fail until it is configured");
    }

    let connections = Arc::new(ConnectionManager::from_config(connector, &db_config));

    let (analytics, analytics_worker) = match AnalyticsConfig::from_env() {
        Some(config) => {
            info!(host = %config.host, "Sending analytics to PostHog");
            let (analytics, worker) = PosthogAnalytics::spawn(config);
            (Arc::new(analytics) as SharedAnalytics, Some(worker))
        }
        None => (Arc::new(TracingAnalytics) as SharedAnalytics, None),
    };

    let state = AppState {
        writer: BookingWriter::new(connections),
        analytics,
    };
    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    info!("Starting eventbook server on {}", args.bind);

    // Run server (blocks until shutdown); the state, and with it the last
    // analytics sender, is dropped on return
    let served = run_server(state, config).await.context("Server error");

    if let Some(worker) = analytics_worker {
        drain_analytics(worker, ANALYTICS_DRAIN_LIMIT).await;
    }

    served
}

async fn run_migrate(args: DatabaseArgs) -> Result<()> {
    let config = args.into_config();
    let url = config
        .url
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

    let pool = db::create_pool(&url, 1)
        .await
        .context("Failed to connect to database")?;
    db::migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    pool.close().await;

    info!("Bookings table is ready");
    Ok(())
}
