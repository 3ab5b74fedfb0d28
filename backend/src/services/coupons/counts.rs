use crate::auth::AuthUser;
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};

pub async fn process(state: web::Data<AppState>, _user: AuthUser) -> impl Responder {
    let store = state.store.clone();
    let result = run_blocking(move || store.counts()).await;
    report::respond(report::from_result(
        result,
        "Coupon statistics retrieved successfully",
    ))
}
