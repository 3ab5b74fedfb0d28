use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::ingest::validator::CodeValidator;
use crate::ingest::{ParsedBatch, PersistenceGate};
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};
use common::model::upload::UploadSummary;
use common::requests::UniqueCodeRequest;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: web::Json<UniqueCodeRequest>,
) -> impl Responder {
    let result = add_coupon_code(state.get_ref().clone(), payload.into_inner()).await;
    if let Ok(summary) = &result {
        info!("'{}' added {} coupon code", user.user_name, summary.new_codes_added);
    }
    report::respond(report::from_result(result, "Coupon code added"))
}

/// Manual single insert, held to the same rules as a one-row upload.
pub async fn add_coupon_code(
    state: AppState,
    req: UniqueCodeRequest,
) -> Result<UploadSummary, ServiceError> {
    let raw = req.unique_code.unwrap_or_default();
    let code = CodeValidator::new(state.config.ingest.max_code_len)
        .validate(&raw)
        .map_err(|reason| ServiceError::BadRequest(reason.to_string()))?;

    let store = state.store.clone();
    let summary = run_blocking(move || {
        let batch = ParsedBatch { codes: vec![code] };
        PersistenceGate::new(&store).commit(&batch)
    })
    .await?;

    if summary.new_codes_added == 0 {
        return Err(ServiceError::BadRequest(
            "Unique Code already exists".to_string(),
        ));
    }
    Ok(summary)
}
