// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::battlelog::BattleLogClient;
use crate::util::db::Db;
use crate::util::env as env_util;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_util::env_opt("API_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .context("Invalid API_PORT")?;

        let allowed_origins = env_util::env_opt("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db, battlelog: BattleLogClient) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            "Starting royale-tracker API server"
        );

        let db_data = web::Data::new(db);
        let client_data = web::Data::new(battlelog);
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(client_data.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
