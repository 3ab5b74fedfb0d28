//! Operator login and profile lookup.
//!
//! - `POST /verifyLogin`: exchanges `userName`/`password` for a bearer token.
//! - `GET /getUserDetail`: profile of the token holder.

mod login;
mod user_detail;

use actix_web::web::{get, post, ServiceConfig};

pub fn configure_routes(cfg: &mut ServiceConfig) {
    cfg.route("/verifyLogin", post().to(login::process))
        .route("/getUserDetail", get().to(user_detail::process));
}
