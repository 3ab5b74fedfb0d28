//! Consumer-facing redemption of a coupon code.
//!
//! The lookup happens before geolocation so unknown codes never cost a remote
//! call. The write itself only flips an unverified row, so two simultaneous
//! scans of the same code cannot both succeed under the reject policy.

use crate::config::ReverifyPolicy;
use crate::error::ServiceError;
use crate::geo::client_ip;
use crate::report;
use crate::state::{run_blocking, AppState};
use crate::store::{timestamp_now, VerifyOutcome};
use actix_web::{web, HttpRequest, Responder};
use common::model::coupon::{CouponCode, VerificationDetails};
use common::requests::UniqueCodeRequest;
use log::info;
use std::net::IpAddr;

pub async fn process(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<UniqueCodeRequest>,
) -> impl Responder {
    let ip = client_ip(&req);
    let result = verify_code(state.get_ref().clone(), payload.into_inner(), ip).await;
    report::respond(report::from_result(result, "Coupon verified successfully"))
}

pub async fn verify_code(
    state: AppState,
    req: UniqueCodeRequest,
    ip: Option<IpAddr>,
) -> Result<VerificationDetails, ServiceError> {
    let code = req
        .unique_code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("Unique Code is required".to_string()))?;
    let policy = state.config.reverify_policy;

    let store = state.store.clone();
    let lookup_code = code.clone();
    let coupon = run_blocking(move || store.find_by_code(&lookup_code))
        .await?
        .ok_or_else(invalid_code)?;
    if coupon.is_verified() && policy != ReverifyPolicy::Overwrite {
        return already_verified(coupon, policy);
    }

    let location = state.geo.locate(ip).await;
    let store = state.store.clone();
    let overwrite = policy == ReverifyPolicy::Overwrite;
    let outcome = run_blocking(move || {
        store.mark_verified(&code, &timestamp_now(), &location, overwrite)
    })
    .await?;

    match outcome {
        VerifyOutcome::Verified(coupon) => {
            info!(
                "coupon {} verified from {}",
                coupon.unique_code,
                coupon.verified_location.as_deref().unwrap_or("-")
            );
            Ok(details(coupon))
        }
        VerifyOutcome::AlreadyVerified(coupon) => already_verified(coupon, policy),
        VerifyOutcome::NotFound => Err(invalid_code()),
    }
}

fn already_verified(
    coupon: CouponCode,
    policy: ReverifyPolicy,
) -> Result<VerificationDetails, ServiceError> {
    match policy {
        ReverifyPolicy::Idempotent => Ok(details(coupon)),
        _ => Err(ServiceError::AlreadyVerified),
    }
}

fn invalid_code() -> ServiceError {
    ServiceError::NotFound("Invalid coupon code".to_string())
}

fn details(coupon: CouponCode) -> VerificationDetails {
    VerificationDetails {
        unique_code: coupon.unique_code,
        verified_on: coupon.verified_on,
        verified_location: coupon.verified_location,
    }
}
