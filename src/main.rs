//! Chirper - Social Media REST Backend
//! Mission: Tweets, replies, likes, and follows behind session-less JWT auth

use anyhow::{Context, Result};
use chirper_backend::{api::create_router, auth::JwtHandler, storage::Database};
use clap::Parser;
use dotenv::dotenv;
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chirper")]
#[command(about = "Social media REST backend with JWT bearer authentication")]
struct Args {
    /// Address to bind the API server on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: String,

    /// SQLite database path; relative paths resolve against the crate root
    #[arg(long, env = "DATABASE_PATH", default_value = "chirper.db")]
    database: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let args = Args::parse();

    info!("🚀 Chirper backend starting");

    // The signing secret is deployment configuration; refusing to start
    // beats signing tokens with an empty string.
    let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

    let db_path = resolve_data_path(&args.database);
    let db = Arc::new(Database::new(&db_path)?);
    db.seed_default_admin()?;

    let jwt = Arc::new(JwtHandler::new(jwt_secret));
    let app = create_router(db, jwt);

    let listener = TcpListener::bind(&args.bind).await?;
    info!("🎯 API server listening on {}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirper_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate root .env for
    // runs with --manifest-path from elsewhere
    let _ = dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}

fn resolve_data_path(raw: &str) -> String {
    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    // Treat relative paths as relative to the crate root, not the caller's cwd
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(p)
        .to_string_lossy()
        .to_string()
}
