// HTTP API for the match tracker: player registration, match history,
// and the sync trigger.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
