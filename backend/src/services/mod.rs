//! HTTP handlers, grouped by area. Each area registers its routes on the
//! shared `/api/v1` scope.

pub mod auth;
pub mod coupons;

use actix_web::web::{get, scope};
use actix_web::{HttpResponse, Responder, Scope};

const API_PATH: &str = "/api/v1";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .configure(auth::configure_routes)
        .configure(coupons::configure_routes)
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "message": "API is running" }))
}

/// `GET /api/health`, outside the versioned scope.
pub fn health_route() -> actix_web::Resource {
    actix_web::web::resource("/api/health").route(get().to(health))
}
