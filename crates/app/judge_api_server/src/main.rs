//! Judge API server binary.
//!
//! Prints `{"port": N}` to stdout once the listener is bound so callers can
//! discover an ephemeral port.

use clap::Parser;
use judge_api::AppState;
use judge_api::config::ApiConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "judge_api_server", about = "Judge API server")]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/judge"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep all data in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Write logs to stderr so stdout is reserved for the JSON port message.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,judge_api=debug,judge_core=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = format!("{}:{}", args.host, args.port);
    config.database_url = args.database_url;

    let state = if args.memory_store {
        warn!("using the in-memory store; data is lost on exit");
        AppState::in_memory(config.clone())
    } else {
        info!(
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;

        info!("running database migrations");
        judge_api::migrate(&pool).await?;

        AppState::with_postgres(pool, config.clone())
    };

    let app = judge_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    println!("{}", serde_json::json!({ "port": local_addr.port() }));
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
