use serde::{Deserialize, Serialize};

pub mod classify;
pub mod filter;
pub mod remote_path;

pub type Md5Digest = String;

/// What the backend knows about a local file's remote counterpart.
///
/// `path_match` and `md5_match` are independent: content can match at a
/// different path, and a path can be occupied by different content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceReport {
    pub success: bool,
    pub path_match: bool,
    pub md5_match: bool,
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Terminal result of one upload cycle, as reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(default)]
    pub data: OutcomeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeData {
    pub message: Option<String>,
    pub exists: Option<bool>,
    pub md5_match: Option<bool>,
    pub path_match: Option<bool>,
    pub retry: Option<bool>,
}

/// Transport-level response details, when a response was received at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    pub status: u16,
    pub body: Option<String>,
}

/// Payload handed to the completion hook, once per upload cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCompletion {
    pub response: Option<ResponseInfo>,
    pub outcome: UploadOutcome,
    pub local_path: String,
    pub remote_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}
