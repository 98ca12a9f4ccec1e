use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of client-local storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
