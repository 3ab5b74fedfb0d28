use serde::{Deserialize, Serialize};

/// Public view of an operator account. The password never leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub user_name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    /// 1 = active, 0 = inactive.
    pub status: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub user: UserProfile,
}
