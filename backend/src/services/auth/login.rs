use crate::error::ServiceError;
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};
use common::model::user::LoginResult;
use common::requests::LoginRequest;
use log::info;

pub async fn process(state: web::Data<AppState>, payload: web::Json<LoginRequest>) -> impl Responder {
    let result = login(state.get_ref().clone(), payload.into_inner()).await;
    report::respond(report::from_result(result, "Login successful"))
}

pub async fn login(state: AppState, req: LoginRequest) -> Result<LoginResult, ServiceError> {
    let (user_name, password) = match (req.user_name, req.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u.trim().to_string(), p),
        _ => {
            return Err(ServiceError::BadRequest(
                "Username and password are required".to_string(),
            ))
        }
    };

    let store = state.store.clone();
    let user = run_blocking(move || {
        let user = store
            .find_user_by_credentials(&user_name, &password)?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid username or password".to_string()))?;
        if !user.is_active() {
            return Err(ServiceError::Forbidden(
                "Account is inactive. Please contact admin".to_string(),
            ));
        }
        store.touch_last_login(user.profile.id)?;
        Ok(user)
    })
    .await?;

    let token = state.tokens.issue(&user.profile)?;
    info!("operator '{}' logged in", user.profile.user_name);
    Ok(LoginResult {
        token,
        user: user.profile,
    })
}
