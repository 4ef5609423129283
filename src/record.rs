use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One log event, with context attributes and event fields merged into
/// `fields`.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    #[serde(rename = "msg", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}
