//! Coupon code management and redemption.
//!
//! Operator routes (bearer token required):
//! - `GET /generateUniqueCodeUploadFile`: writes an empty upload template and
//!   returns its public path.
//! - `POST /couponCodeUploadFile`: multipart CSV upload. The file is spooled to
//!   a temporary file, parsed fail-fast, and the accepted codes are persisted
//!   through the ingestion gate.
//! - `POST /addCouponCode`: inserts a single code through the same rules.
//! - `POST /couponCodeList`: filtered, paginated listing.
//! - `GET /couponCounts`: generated / verified / not verified totals.
//! - `POST /downloadCouponCodeFile`: CSV export of the filtered codes.
//!
//! Public route:
//! - `POST /productVerify`: marks a scanned code as verified and records
//!   where the scan came from.

mod add;
mod counts;
mod download;
mod list;
mod template;
mod upload;
mod verify;

use crate::error::ServiceError;
use actix_web::web::{get, post, ServiceConfig};
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn configure_routes(cfg: &mut ServiceConfig) {
    cfg.route("/generateUniqueCodeUploadFile", get().to(template::process))
        .route("/couponCodeUploadFile", post().to(upload::process))
        .route("/addCouponCode", post().to(add::process))
        .route("/couponCodeList", post().to(list::process))
        .route("/couponCounts", get().to(counts::process))
        .route("/downloadCouponCodeFile", post().to(download::process))
        .route("/productVerify", post().to(verify::process));
}

/// Path under which a generated file is served, e.g. `uploads/sample/x.csv`.
fn public_path(subdir: &str, file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("uploads/{}/{}", subdir, name)
}

/// An empty body means "no parameters"; anything else must be valid JSON for
/// `T`, otherwise the request is refused instead of running unfiltered.
fn optional_json<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::requests::DownloadRequest;

    #[test]
    fn blank_body_is_absent() {
        assert!(optional_json::<DownloadRequest>(b"").unwrap().is_none());
        assert!(optional_json::<DownloadRequest>(b" \r\n").unwrap().is_none());
    }

    #[test]
    fn bad_body_is_rejected() {
        let err = optional_json::<DownloadRequest>(br#"{"filter":{"uniqueCode":999}}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(optional_json::<DownloadRequest>(b"{not json").is_err());

        let ok = optional_json::<DownloadRequest>(br#"{"filter":{"uniqueCode":"A"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(ok.filter.unwrap().unique_code.as_deref(), Some("A"));
    }
}
