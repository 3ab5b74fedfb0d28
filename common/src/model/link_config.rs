use serde::{Deserialize, Serialize};

/// The single active redemption link configuration.
///
/// New coupon codes get `coupon_link + code` as their redemption link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicLinkConfig {
    pub id: i64,
    pub coupon_link: String,
}

impl DynamicLinkConfig {
    pub fn link_for(&self, code: &str) -> String {
        format!("{}{}", self.coupon_link, code)
    }
}
