// HTTP API server binary for royale-tracker

use anyhow::Result;
use royale_tracker::api::ApiServer;
use royale_tracker::battlelog::BattleLogClient;
use royale_tracker::util::db::Db;
use royale_tracker::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    tracing::info!("Initializing royale-tracker API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();

    // Load configuration from environment
    let server = ApiServer::from_env()?;

    // Initialize database connection
    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Database connected successfully");

    // Upstream battle-log client (token may be absent; sync reports it)
    let battlelog = BattleLogClient::from_env()?;

    // Start HTTP server
    server.run(db, battlelog).await?;

    Ok(())
}
