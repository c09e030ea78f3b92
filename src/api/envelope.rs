use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result-set metadata returned by every listing operation. `total` counts
/// the whole table; `total_filtered` counts the rows matching the request's
/// filters and degrades to `total` when the filtered count cannot be
/// computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMetadata {
    pub page: i64,
    pub total: i64,
    pub total_filtered: i64,
    pub records_per_page: i64,
    pub source: String,
}

/// Envelope for listing responses: metadata, materialized rows, and any
/// non-fatal errors collected along the way (count-query failures).
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub metadata: ListMetadata,
    pub data: Vec<Value>,
    pub errors: Vec<String>,
}
