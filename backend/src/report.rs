//! Turns service outcomes into the uniform `ApiResponse` envelope.

use crate::error::ServiceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::model::response::ApiResponse;
use common::model::upload::UploadSummary;
use log::{debug, error};
use serde::Serialize;

pub const NO_VALID_CODES: &str = "No valid unique codes found";

/// Serialises the envelope with its own status code.
pub fn respond<T: Serialize>(body: ApiResponse<T>) -> HttpResponse {
    let status =
        StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(body)
}

pub fn failure<T>(err: &ServiceError) -> ApiResponse<T> {
    if err.is_internal() {
        error!("{}", err);
    } else {
        debug!("request rejected: {}", err);
    }
    ApiResponse::failure(err.status_code(), err.public_message())
}

pub fn from_result<T>(result: Result<T, ServiceError>, message: &str) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::ok(message, data),
        Err(e) => failure(&e),
    }
}

pub fn summary_message(summary: &UploadSummary) -> String {
    if summary.new_codes_added == 0 {
        return format!("All {} codes already exist.", summary.duplicates_skipped);
    }
    let mut message = format!("Processed {} codes.", summary.new_codes_added);
    if summary.duplicates_skipped > 0 {
        message.push_str(&format!(" {} duplicates skipped.", summary.duplicates_skipped));
    }
    message
}

/// `Ok(None)` means the file had a valid header but no data rows.
pub fn upload_outcome(
    result: Result<Option<UploadSummary>, ServiceError>,
) -> ApiResponse<UploadSummary> {
    match result {
        Ok(Some(summary)) => ApiResponse::ok(summary_message(&summary), summary),
        Ok(None) => ApiResponse::ok(NO_VALID_CODES, UploadSummary::default()),
        Err(e) => failure(&e),
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(ServiceError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        respond(failure::<()>(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowRejection;

    #[test]
    fn summary_messages() {
        let fresh = UploadSummary {
            total_processed: 5,
            new_codes_added: 5,
            duplicates_skipped: 0,
        };
        assert_eq!(summary_message(&fresh), "Processed 5 codes.");

        let mixed = UploadSummary {
            total_processed: 5,
            new_codes_added: 3,
            duplicates_skipped: 2,
        };
        assert_eq!(summary_message(&mixed), "Processed 3 codes. 2 duplicates skipped.");

        let repeat = UploadSummary {
            total_processed: 4,
            new_codes_added: 0,
            duplicates_skipped: 4,
        };
        assert_eq!(summary_message(&repeat), "All 4 codes already exist.");
    }

    #[test]
    fn outcomes_map_to_statuses() {
        let empty = upload_outcome(Ok(None));
        assert_eq!(empty.status_code, 200);
        assert!(empty.success);
        assert_eq!(empty.message, NO_VALID_CODES);

        let rejected = upload_outcome(Err(ServiceError::Validation {
            row: 3,
            reason: RowRejection::Empty,
        }));
        assert_eq!(rejected.status_code, 400);
        assert!(!rejected.success);
        assert_eq!(rejected.message, "Row 3: Unique Code cannot be empty");

        assert_eq!(upload_outcome(Err(ServiceError::ParseTimeout)).status_code, 408);
        assert_eq!(upload_outcome(Err(ServiceError::ConfigMissing)).status_code, 500);
    }

    #[test]
    fn error_response_uses_envelope_status() {
        let resp = ServiceError::NotFound("Invalid coupon code".into()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
