use serde::{Deserialize, Serialize};

use crate::model::coupon::CouponListItem;

/// Uniform envelope for every JSON response of the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 200,
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_records: u64,
    pub records_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub start_record: u64,
    pub end_record: u64,
}

/// One page of the coupon listing. `pagination` is absent when the caller asked
/// for every record (`pagelimit = 0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPage {
    pub records: Vec<CouponListItem>,
    pub pagination: Option<Pagination>,
}

/// Points at a generated CSV under the public uploads path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub file_name: String,
}
