use serde::{Deserialize, Serialize};

/// A stored coupon code.
///
/// `link_unique_coupon_cc` is computed once, when the row is created, from the
/// link prefix that was active at that moment. Later prefix changes never touch
/// it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CouponCode {
    pub id: i64,
    pub unique_code: String,
    pub link_unique_coupon_cc: String,
    pub date_created: String,
    /// 0 until the code is redeemed, then 1.
    pub verified_flag: u8,
    pub verified_on: Option<String>,
    pub verified_location: Option<String>,
}

impl CouponCode {
    pub fn is_verified(&self) -> bool {
        self.verified_flag == 1
    }
}

/// Row shape returned by the paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponListItem {
    pub id: i64,
    pub date_created: String,
    pub unique_code: String,
    pub link_unique_coupon_cc: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CouponCounts {
    pub total_generated: u64,
    pub total_verified: u64,
    pub total_not_verified: u64,
}

/// What a consumer gets back after scanning a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    pub unique_code: String,
    pub verified_on: Option<String>,
    pub verified_location: Option<String>,
}
