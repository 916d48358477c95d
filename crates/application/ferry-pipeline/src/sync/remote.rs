use std::fs;

use camino::Utf8Path;
use ferry_core::filter::is_ignored;
use ferry_core::remote_path::MirrorPath;
use ferry_core::{ExistenceReport, FileCompletion, OutcomeData, ResponseInfo, UploadOutcome};
use ferry_infra::net::{self, NetError, StreamResponse};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::progress::TransferHooks;
use crate::sync::{RemoteBackend, SyncError, UploadOptions};

/// HTTP-based backend over a drive-style REST API.
///
/// Existence is resolved client-side from two node lookups (by mirrored
/// path, then by content digest); uploads stream the file body and replay
/// retryable failures internally, surfacing one completion per cycle.
pub struct HttpBackend {
    client: Client,
    api_url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    path: String,
    md5: String,
}

#[derive(Debug, Default, Deserialize)]
struct NodeList {
    #[serde(default)]
    nodes: Vec<NodeInfo>,
}

fn retryable_outcome(message: String) -> UploadOutcome {
    UploadOutcome {
        success: false,
        data: OutcomeData {
            message: Some(message),
            retry: Some(true),
            ..OutcomeData::default()
        },
    }
}

impl HttpBackend {
    pub fn new(client: Client, api_url: &str, token: impl Into<String>) -> Result<Self, SyncError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| SyncError::Remote(format!("invalid api url {api_url}: {e}")))?;
        Ok(Self {
            client,
            api_url,
            token: token.into(),
        })
    }

    fn endpoint(&self, segment: &str) -> Result<Url, SyncError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Remote("invalid api url".into()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    fn file_url(&self, remote_path: &str, options: &UploadOptions) -> Result<Url, SyncError> {
        let mut url = self.endpoint("files")?;
        url.query_pairs_mut()
            .append_pair("path", remote_path)
            .append_pair("overwrite", if options.overwrite { "true" } else { "false" });
        Ok(url)
    }

    async fn query_nodes(&self, key: &str, value: &str) -> Result<Vec<NodeInfo>, SyncError> {
        let url = self.endpoint("nodes")?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[(key, value)])
            .send()
            .await
            .map_err(|e| SyncError::Remote(format!("node lookup failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(SyncError::Remote(format!(
                "node lookup returned status {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SyncError::Remote(format!("node lookup body failed: {e}")))?;
        let list: NodeList = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::Remote(format!("node list parse failed: {e}")))?;
        Ok(list.nodes)
    }

    /// One transfer attempt. `Ok` carries the transport response (when one
    /// arrived) and the outcome to classify; connection-level failures are
    /// folded into a retryable outcome so the cycle loop can replay them.
    async fn transfer(
        &self,
        local_path: &Utf8Path,
        remote_path: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(Option<ResponseInfo>, UploadOutcome), SyncError> {
        let url = self.file_url(remote_path, options)?;
        let sent = net::upload_stream(&self.client, url, &self.token, local_path, |n| {
            hooks.on_file_progress(local_path, n);
        })
        .await;

        match sent {
            Ok(StreamResponse { status, body }) => {
                let response = Some(ResponseInfo {
                    status,
                    body: if body.trim().is_empty() {
                        None
                    } else {
                        Some(body.clone())
                    },
                });
                let outcome = match serde_json::from_str::<UploadOutcome>(&body) {
                    Ok(outcome) => outcome,
                    Err(_) if (500..600).contains(&status) => {
                        retryable_outcome(format!("server returned status {status}"))
                    }
                    Err(_) => UploadOutcome {
                        success: (200..300).contains(&status),
                        data: OutcomeData::default(),
                    },
                };
                Ok((response, outcome))
            }
            Err(NetError::Io(e)) => {
                Err(SyncError::Local(format!("Cannot read '{local_path}': {e}")))
            }
            Err(NetError::Task(e)) => Err(SyncError::Remote(format!("upload task failed: {e}"))),
            // No response at all: connection-level failure, replayed like a 5xx.
            Err(NetError::Http(e)) => Ok((None, retryable_outcome(format!("transport error: {e}")))),
        }
    }
}

#[async_trait::async_trait]
impl RemoteBackend for HttpBackend {
    async fn exists(
        &self,
        remote_path: &str,
        local_path: &Utf8Path,
    ) -> Result<ExistenceReport, SyncError> {
        let md5 = ferry_infra::hashing::md5_hex(local_path)
            .map_err(|e| SyncError::Local(format!("Cannot hash '{local_path}': {e}")))?;

        if let Some(node) = self.query_nodes("path", remote_path).await?.into_iter().next() {
            let md5_match = node.md5.eq_ignore_ascii_case(&md5);
            return Ok(ExistenceReport {
                success: true,
                path_match: true,
                md5_match,
                nodes: vec![node.path],
            });
        }

        let content_nodes = self.query_nodes("md5", &md5).await?;
        if content_nodes.is_empty() {
            return Ok(ExistenceReport::default());
        }
        Ok(ExistenceReport {
            success: true,
            path_match: false,
            md5_match: true,
            nodes: content_nodes.into_iter().map(|n| n.path).collect(),
        })
    }

    async fn upload_file(
        &self,
        local_path: &Utf8Path,
        remote_folder: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), SyncError> {
        let file_name = local_path.file_name().ok_or_else(|| {
            SyncError::Invocation(format!("'{local_path}' has no file name"))
        })?;
        let remote_path = {
            let mut segs = MirrorPath::segments(remote_folder);
            segs.push(file_name.to_string());
            segs.join("/")
        };

        let total_bytes = fs::metadata(local_path.as_std_path())
            .map_err(|e| SyncError::Local(format!("Cannot stat '{local_path}': {e}")))?
            .len();

        if !options.force && !options.suppress_dedupe {
            let report = self.exists(&remote_path, local_path).await.unwrap_or_default();
            if report.md5_match {
                // Identical content already present; skip the transfer.
                hooks.on_file_complete(&FileCompletion {
                    response: None,
                    outcome: UploadOutcome {
                        success: false,
                        data: OutcomeData {
                            message: Some(format!("Node '{remote_path}' already exists")),
                            exists: Some(true),
                            md5_match: Some(true),
                            path_match: Some(report.path_match),
                            retry: None,
                        },
                    },
                    local_path: local_path.to_string(),
                    remote_path,
                });
                return Ok(());
            }
        }

        let mut attempt = options.retry_attempt;
        loop {
            hooks.on_file_start(local_path, total_bytes);

            let (response, outcome) = self
                .transfer(local_path, &remote_path, options, &mut *hooks)
                .await?;
            let completion = FileCompletion {
                response,
                outcome,
                local_path: local_path.to_string(),
                remote_path: remote_path.clone(),
            };
            hooks.on_file_complete(&completion);

            let replay = !completion.outcome.success
                && completion.outcome.data.retry == Some(true)
                && attempt < options.num_retries;
            if !replay {
                return Ok(());
            }
            attempt += 1;
            debug!("retrying '{local_path}' (attempt {attempt} of {})", options.num_retries);
        }
    }

    async fn upload_directory(
        &self,
        local_path: &Utf8Path,
        remote_folder: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), SyncError> {
        let remote_root = MirrorPath::destination_root(remote_folder, local_path.as_str())
            .ok_or_else(|| {
                SyncError::Invocation(format!("Cannot derive a remote folder for '{local_path}'"))
            })?;

        for entry in WalkDir::new(local_path.as_std_path()).sort_by_file_name() {
            let entry = entry
                .map_err(|e| SyncError::Local(format!("Cannot walk '{local_path}': {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8Path::from_path(entry.path()).ok_or_else(|| {
                SyncError::Local(format!("Non-UTF-8 path: {}", entry.path().display()))
            })?;

            let name = path.file_name().unwrap_or_default();
            if is_ignored(name, &options.ignore_files) {
                debug!("ignoring {path}");
                continue;
            }

            // Mirror the file's parent directory under the remote root.
            let parent = path.parent().unwrap_or(local_path);
            let remote_parent = MirrorPath::map(local_path.as_str(), &remote_root, parent.as_str())
                .ok_or_else(|| {
                    SyncError::Local(format!("'{path}' is not under '{local_path}'"))
                })?;

            self.upload_file(path, &remote_parent, options, &mut *hooks)
                .await?;
        }

        Ok(())
    }
}
