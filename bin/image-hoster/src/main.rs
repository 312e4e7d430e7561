//! # image-hoster Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use ih_api::handlers::AppState;
use ih_api::session::SessionSigner;
use std::sync::Arc;

// Feature-gated imports: the binary is compiled to order
#[cfg(feature = "db-sqlite")]
use ih_db_sqlite::SqliteImageRepo;

#[cfg(feature = "auth-simple")]
use ih_auth_simple::SimplePasswordAuth;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:image_hoster.db".to_string());
    let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
        log::warn!("SESSION_SECRET not set; sessions won't survive code that guesses the default");
        "insecure-dev-secret".to_string()
    });

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = Arc::new(
        SqliteImageRepo::new(&database_url)
            .await
            .expect("Failed to init SQLite"),
    );

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimplePasswordAuth::new();

    // 3. Wrap in AppState (the SQLite plugin backs both repo ports)
    let state = web::Data::new(AppState::new(
        repo.clone(),
        repo,
        Box::new(auth),
        SessionSigner::new(session_secret.as_bytes()),
    ));

    log::info!("🚀 image-hoster starting on http://127.0.0.1:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(ih_api::middleware::standard_middleware())
            .service(Files::new("/static", "./static"))
            .configure(ih_api::configure_routes)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
