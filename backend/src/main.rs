use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use coupon_backend::config::AppConfig;
use coupon_backend::configure_app;
use coupon_backend::state::AppState;
use env_logger::Env;
use log::{error, info};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(to_io)?;
    std::fs::create_dir_all(&config.upload_dir)?;
    let (host, port) = (config.host.clone(), config.port);

    let state = AppState::new(config).map_err(to_io)?;
    state.bootstrap().map_err(|e| {
        error!("startup failed: {}", e);
        to_io(e)
    })?;

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| configure_app(&state, cfg))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn to_io(e: coupon_backend::error::ServiceError) -> io::Error {
    io::Error::other(e.to_string())
}
