//! Storage handle. Constructed once at process start and injected into each
//! operation; no process-global connection state.

use crate::util::env::env_flag;
use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    /// Open the pool and bring the schema up to date.
    ///
    /// Migrations are the embedded, versioned files under `migrations/`; the
    /// persisted shape of an entity only ever changes through a new migration
    /// step. Set `AUTO_MIGRATE=0` to skip when the schema is managed
    /// externally.
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?;
        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");

        if env_flag("AUTO_MIGRATE", true) {
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("migrations up-to-date");
        } else {
            info!("AUTO_MIGRATE disabled; skipping migrations");
        }

        Ok(Self { pool })
    }
}
