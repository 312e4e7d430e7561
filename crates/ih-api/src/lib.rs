//! # ih-api
//!
//! The web routing and orchestration layer for the image hoster.

pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod session;

use actix_web::web;

/// Configures the routes for the image hoster.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
/// `/images/upload` is registered before `/images/{id}/{title}` so the
/// literal segment wins.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/", web::get().to(handlers::index))
            // Browsing
            .route("/images", web::get().to(handlers::list_images))
            .route("/images/upload", web::get().to(handlers::upload_form))
            .route("/images/upload", web::post().to(handlers::create_image))
            .route("/images/{id}/{title}", web::get().to(handlers::show_image))
            // Mutation
            .route("/editImage", web::get().to(handlers::edit_form))
            .route("/editImage", web::post().to(handlers::edit_submit))
            .route("/deleteImage", web::post().to(handlers::delete_image))
            .route(
                "/image/{image_id}/{image_title}/comments",
                web::post().to(handlers::create_comment),
            )
            // Accounts
            .route(
                "/users/registration",
                web::get().to(handlers::registration_form),
            )
            .route(
                "/users/registration",
                web::post().to(handlers::registration_submit),
            )
            .route("/users/login", web::get().to(handlers::login_form))
            .route("/users/login", web::post().to(handlers::login_submit))
            .route("/users/logout", web::get().to(handlers::logout)),
    );
}
