pub mod db;
pub mod error;
pub mod flash;
pub mod forms;
pub mod models;
pub mod route;
pub mod schema;
pub mod serialize;
pub mod views;

use actix_web::{get, web::Json, HttpResponse};
use clap::Parser;

use showbill_lib::Page;

use crate::flash::Flashes;

/// The landing page: no data of its own, just the pending notices left by
/// the last mutation.
#[get("/")]
pub async fn home(flashes: Flashes) -> Json<Page<()>> {
    Json(Page {
        flashes: flashes.0,
        data: (),
    })
}

/// Fallback for routes nothing else matched.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

#[derive(Parser)]
pub struct Opt {
    /// Address to bind to.
    #[clap(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// Port to bind to.
    #[clap(short, long, env = "BIND_PORT", default_value = "8080")]
    pub port: u16,

    /// Postgresql URL.
    #[clap(short, long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Whether to run database migrations on startup.
    #[clap(short, long, env = "RUN_MIGRATIONS")]
    pub run_migrations: bool,

    /// The secret key to use when encrypting cookies.
    #[clap(long, env = "COOKIE_SECRET_KEY")]
    pub cookie_secret_key: String,
}
