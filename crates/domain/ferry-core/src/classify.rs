use crate::{ExistenceReport, FileCompletion, Severity};

/// How a local file relates to what already exists remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    /// Same path, same content.
    Identical,
    /// Same path, different content.
    Conflict,
    /// Content found at one or more other locations.
    Relocated,
    /// Not found remotely (or the lookup itself failed).
    Missing,
}

/// Classification is a total function of `(success, path_match, md5_match)`.
pub fn classify_existence(report: &ExistenceReport) -> CompareKind {
    if !report.success {
        CompareKind::Missing
    } else if report.path_match && report.md5_match {
        CompareKind::Identical
    } else if report.path_match {
        CompareKind::Conflict
    } else {
        CompareKind::Relocated
    }
}

/// One comparator report per local file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareReport {
    pub local_path: String,
    pub remote_path: String,
    pub kind: CompareKind,
    pub nodes: Vec<String>,
}

impl CompareReport {
    pub fn new(local_path: String, remote_path: String, existence: &ExistenceReport) -> Self {
        Self {
            local_path,
            remote_path,
            kind: classify_existence(existence),
            nodes: existence.nodes.clone(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            CompareKind::Identical => Severity::Info,
            CompareKind::Conflict | CompareKind::Relocated => Severity::Warn,
            CompareKind::Missing => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            CompareKind::Identical => {
                format!("File {} exists and is identical to local copy", self.remote_path)
            }
            CompareKind::Conflict => {
                format!("File {} exists but does not match local copy", self.remote_path)
            }
            CompareKind::Relocated => format!(
                "File {} exists at the following location: {}",
                self.remote_path,
                self.nodes.join(", ")
            ),
            CompareKind::Missing => format!("File {} does not exist", self.remote_path),
        }
    }
}

/// A leveled log line for one upload completion cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub severity: Severity,
    pub message: String,
}

impl CompletionReport {
    /// Classify a completion payload.
    ///
    /// The branch over `OutcomeData` is taken literally from the payload
    /// fields rather than re-derived from an `ExistenceReport`; the backend
    /// owns the population rules for `exists`.
    pub fn classify(completion: &FileCompletion) -> Self {
        if let Some(response) = &completion.response {
            let body_valid = response
                .body
                .as_deref()
                .map(|b| !b.trim().is_empty())
                .unwrap_or(false);
            if !body_valid {
                return Self {
                    severity: Severity::Error,
                    message: format!(
                        "Failed to upload file '{}': invalid body returned with status code {}",
                        completion.local_path, response.status
                    ),
                };
            }
        }

        if completion.outcome.success {
            return Self {
                severity: Severity::Info,
                message: format!(
                    "Successfully uploaded file '{}' to '{}'",
                    completion.local_path, completion.remote_path
                ),
            };
        }

        let data = &completion.outcome.data;
        let mut message = format!("Failed to upload file '{}'", completion.local_path);
        match &data.message {
            Some(m) => message.push_str(&format!(": {m}")),
            None => message.push_str(&format!(
                ": {}",
                serde_json::to_string(data).unwrap_or_default()
            )),
        }

        let severity = if data.exists == Some(true) {
            if data.md5_match == Some(true) && data.path_match == Some(true) {
                Severity::Warn
            } else {
                Severity::Error
            }
        } else if data.retry == Some(true) {
            Severity::Warn
        } else {
            Severity::Error
        };

        Self { severity, message }
    }
}
