//! Coupon verification backend.
//!
//! Operators log in, bulk-upload coupon codes from CSV, list and export them;
//! consumers redeem a code by scanning it. The bulk upload path lives in
//! [`ingest`]; everything else is a thin handler over [`store`].

pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod report;
pub mod services;
pub mod state;
pub mod store;

use actix_files::Files;
use actix_web::web;
use error::ServiceError;
use state::AppState;

const JSON_LIMIT: usize = 1024 * 1024;

/// Registers state, API routes and the public `/uploads` directory.
pub fn configure_app(state: &AppState, cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::Data::new(state.clone()))
        .app_data(web::JsonConfig::default().limit(JSON_LIMIT).error_handler(|err, _| {
            ServiceError::BadRequest(format!("Invalid request body: {}", err)).into()
        }))
        .app_data(web::PayloadConfig::new(JSON_LIMIT))
        .service(services::health_route())
        .service(services::configure_routes())
        .service(Files::new("/uploads", state.config.upload_dir.clone()));
}
