use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: Option<String>,
    pub password: Option<String>,
}

/// Substring filters shared by the listing and the CSV export.
///
/// Both snake_case and camelCase keys are accepted since the listing and
/// export clients historically sent different spellings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CouponFilter {
    #[serde(default, alias = "dateCreated")]
    pub date_created: Option<String>,
    #[serde(default, alias = "uniqueCode")]
    pub unique_code: Option<String>,
    #[serde(default, alias = "linkUniqueCouponCc")]
    pub link_unique_coupon_cc: Option<String>,
}

/// Listing parameters, accepted from the query string and the JSON body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CouponListRequest {
    #[serde(default, alias = "pageLimit", deserialize_with = "lenient_number")]
    pub pagelimit: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub start: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u64>,
    #[serde(default, rename = "verifiedFlag", deserialize_with = "lenient_number")]
    pub verified_flag: Option<u8>,
    #[serde(default)]
    pub filter: Option<CouponFilter>,
}

impl CouponListRequest {
    /// Body values win over query values, field by field.
    pub fn merge(self, body: CouponListRequest) -> CouponListRequest {
        CouponListRequest {
            pagelimit: body.pagelimit.or(self.pagelimit),
            start: body.start.or(self.start),
            page: body.page.or(self.page),
            verified_flag: body.verified_flag.or(self.verified_flag),
            filter: body.filter.or(self.filter),
        }
    }
}

/// Accepts `5`, `"5"` or `null`. Clients send paging values as strings, and
/// query-string values always arrive as text. A blank string counts as absent.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => T::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("number {} is out of range", n))),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{}' is not a valid number", text))),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub filter: Option<CouponFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueCodeRequest {
    pub unique_code: Option<String>,
}
