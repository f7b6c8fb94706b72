//! Wire records exchanged with the Data Mosaic backend.
//!
//! Field names follow the backend's JSON exactly: sources are snake_case,
//! segments are camelCase.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier. The backend issues integers, older cached
/// payloads and demo fixtures use strings; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        id.parse::<i64>()
            .map(RecordId::Int)
            .unwrap_or_else(|_| RecordId::Text(id.to_string()))
    }
}

/// Parse a backend timestamp. Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Short date for tables; falls back to the raw string.
pub fn display_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

// ─── Sources ──────────────────────────────────────────────────────────────────

/// A configured connection to an external data system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub created_at: String,
}

/// Connection credentials for `POST /sources`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCredentials {
    pub account: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub warehouse: String,
    pub role: String,
}

/// Request body for `POST /sources`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub credentials: SourceCredentials,
}

/// Response of `POST /sources`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCreated {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub id: RecordId,
}

// ─── Segments ─────────────────────────────────────────────────────────────────

/// Request body for `POST /segments/create-and-run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSegment {
    pub query: String,
    /// Omitted from the JSON when the user left the name empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Generated-but-unsaved segment returned by `create-and-run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPreview {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub natural_query: String,
    #[serde(default)]
    pub generated_sql: String,
    pub count: u64,
}

/// Request body for `POST /segments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSegment {
    pub natural_query: String,
    /// The generated SQL
    pub query: String,
    pub name: String,
    pub description: String,
    pub count: u64,
}

/// A persisted segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub natural_query: String,
    #[serde(default)]
    pub sql_query: String,
    pub count: u64,
    #[serde(default)]
    pub created_at: String,
}

// ─── Natural-language query ───────────────────────────────────────────────────

/// Request body for `POST /sql/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskQuestion {
    pub question: String,
}

/// Answer to a natural-language question: the SQL that ran and its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

// ─── Segmented snapshot ───────────────────────────────────────────────────────

/// Request body for `POST /run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub query: String,
}

/// One sub-query of a snapshot. A failed sub-query carries `error` and
/// no rows; the others still count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub query: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Answer to `POST /run`: the question split into segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Always `segmented` today
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub segments: Vec<SegmentResult>,
}
