use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};

pub async fn process(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    let store = state.store.clone();
    let result = run_blocking(move || {
        store
            .find_user(user.id)?
            .map(|record| record.profile)
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    })
    .await;
    report::respond(report::from_result(result, "User Detail"))
}
