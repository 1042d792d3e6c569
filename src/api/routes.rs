// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // Player registration (idempotent create-or-return)
        .route("/players", web::post().to(handlers::create_player))
        // Match history for a player (tag accepted raw, #-prefixed, or %23-encoded)
        .route(
            "/players/{tag}/matches",
            web::get().to(handlers::get_player_matches),
        )
        // Battle log ingestion
        .route("/sync/{tag}", web::post().to(handlers::sync_player));
}
