use serde::{Deserialize, Serialize};

/// Counters reported after a bulk upload has been persisted.
///
/// `duplicates_skipped` counts the codes that were already stored before the
/// insert ran. Codes lost to a concurrent upload at insert time only lower
/// `new_codes_added`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub total_processed: usize,
    pub new_codes_added: usize,
    pub duplicates_skipped: usize,
}
