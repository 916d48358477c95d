use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Router;
use camino::{Utf8Path, Utf8PathBuf};
use ferry_core::classify::CompletionReport;
use ferry_core::{FileCompletion, Severity};
use ferry_pipeline::progress::TransferHooks;
use ferry_pipeline::sync::{HttpBackend, RemoteBackend, UploadOptions, Uploader};
use tempfile::tempdir;

#[derive(Default)]
struct ServerState {
    /// remote path -> content md5
    nodes: HashMap<String, String>,
    /// (remote path, body bytes) per accepted upload
    uploads: Vec<(String, Vec<u8>)>,
    /// 500s served before accepting
    failures_remaining: u32,
    /// accept uploads but answer with an empty body
    empty_body_success: bool,
}

type Shared = Arc<Mutex<ServerState>>;

async fn nodes_route(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let st = state.lock().unwrap();
    if let Some(path) = params.get("path") {
        return match st.nodes.get(path) {
            Some(md5) => (
                StatusCode::OK,
                format!(r#"{{"nodes":[{{"path":"{path}","md5":"{md5}"}}]}}"#),
            ),
            None => (StatusCode::OK, r#"{"nodes":[]}"#.to_string()),
        };
    }
    if let Some(md5) = params.get("md5") {
        let nodes: Vec<String> = st
            .nodes
            .iter()
            .filter(|(_, m)| *m == md5)
            .map(|(p, m)| format!(r#"{{"path":"{p}","md5":"{m}"}}"#))
            .collect();
        return (
            StatusCode::OK,
            format!(r#"{{"nodes":[{}]}}"#, nodes.join(",")),
        );
    }
    (StatusCode::BAD_REQUEST, String::new())
}

async fn files_route(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> (StatusCode, String) {
    let mut st = state.lock().unwrap();
    if st.failures_remaining > 0 {
        st.failures_remaining -= 1;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"success":false,"data":{"message":"upstream hiccup","retry":true}}"#.to_string(),
        );
    }

    let path = params.get("path").cloned().unwrap_or_default();
    st.uploads.push((path, body.to_vec()));

    if st.empty_body_success {
        return (StatusCode::OK, String::new());
    }
    (StatusCode::OK, r#"{"success":true}"#.to_string())
}

async fn start_server(state: Shared) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/nodes", get(nodes_route))
        .route("/files", put(files_route))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn backend_for(addr: SocketAddr) -> HttpBackend {
    HttpBackend::new(
        reqwest::Client::new(),
        &format!("http://{addr}"),
        "test-token",
    )
    .unwrap()
}

#[derive(Default)]
struct CountingHooks {
    starts: Vec<String>,
    progress_bytes: u64,
    completions: Vec<Severity>,
    messages: Vec<String>,
}

impl TransferHooks for CountingHooks {
    fn on_file_start(&mut self, local_path: &Utf8Path, _total_bytes: u64) {
        self.starts.push(local_path.to_string());
    }

    fn on_file_progress(&mut self, _local_path: &Utf8Path, chunk_len: u64) {
        self.progress_bytes += chunk_len;
    }

    fn on_file_complete(&mut self, completion: &FileCompletion) {
        let report = CompletionReport::classify(completion);
        self.completions.push(report.severity);
        self.messages.push(report.message);
    }
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn exists_reports_identical_for_matching_path_and_content() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"same-bytes");
    let md5 = ferry_infra::hashing::md5_hex(&local).unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state
        .lock()
        .unwrap()
        .nodes
        .insert("Backups/photos/a.txt".into(), md5);
    let (addr, handle) = start_server(state).await;

    let report = backend_for(addr)
        .exists("Backups/photos/a.txt", &local)
        .await
        .unwrap();
    assert!(report.success);
    assert!(report.path_match);
    assert!(report.md5_match);

    handle.abort();
}

#[tokio::test]
async fn exists_reports_conflict_when_path_holds_other_content() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"local-bytes");

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state
        .lock()
        .unwrap()
        .nodes
        .insert("Backups/a.txt".into(), "0000deadbeef0000".into());
    let (addr, handle) = start_server(state).await;

    let report = backend_for(addr).exists("Backups/a.txt", &local).await.unwrap();
    assert!(report.success);
    assert!(report.path_match);
    assert!(!report.md5_match);

    handle.abort();
}

#[tokio::test]
async fn exists_finds_relocated_content_by_digest() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"same-bytes");
    let md5 = ferry_infra::hashing::md5_hex(&local).unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state.lock().unwrap().nodes.insert("Old/archive/a.txt".into(), md5);
    let (addr, handle) = start_server(state).await;

    let report = backend_for(addr).exists("Backups/a.txt", &local).await.unwrap();
    assert!(report.success);
    assert!(!report.path_match);
    assert!(report.md5_match);
    assert_eq!(report.nodes, vec!["Old/archive/a.txt"]);

    handle.abort();
}

#[tokio::test]
async fn exists_reports_not_found() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"unique");

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    let (addr, handle) = start_server(state).await;

    let report = backend_for(addr).exists("Backups/a.txt", &local).await.unwrap();
    assert!(!report.success);

    handle.abort();
}

#[tokio::test]
async fn upload_streams_the_bytes_and_logs_success() {
    let dir = tempdir().unwrap();
    let contents = vec![7u8; 200_000];
    let local = write_file(&dir, "big.bin", &contents);

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    backend
        .upload_file(&local, "Backups", &UploadOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.starts.len(), 1);
    assert_eq!(hooks.progress_bytes, contents.len() as u64);
    assert_eq!(hooks.completions, vec![Severity::Info]);

    let st = state.lock().unwrap();
    assert_eq!(st.uploads.len(), 1);
    assert_eq!(st.uploads[0].0, "Backups/big.bin");
    assert_eq!(st.uploads[0].1, contents);

    handle.abort();
}

#[tokio::test]
async fn server_errors_replay_until_success() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "data.bin", &vec![1u8; 1000]);

    let state: Shared = Arc::new(Mutex::new(ServerState {
        failures_remaining: 2,
        ..ServerState::default()
    }));
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    let options = UploadOptions {
        num_retries: 2,
        ..UploadOptions::default()
    };
    backend
        .upload_file(&local, "Backups", &options, &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.starts.len(), 3);
    assert_eq!(
        hooks.completions,
        vec![Severity::Warn, Severity::Warn, Severity::Info]
    );
    assert_eq!(state.lock().unwrap().uploads.len(), 1);

    handle.abort();
}

#[tokio::test]
async fn replay_stops_when_retries_are_exhausted() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "data.bin", b"payload");

    let state: Shared = Arc::new(Mutex::new(ServerState {
        failures_remaining: 5,
        ..ServerState::default()
    }));
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    let options = UploadOptions {
        num_retries: 1,
        ..UploadOptions::default()
    };
    backend
        .upload_file(&local, "Backups", &options, &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.completions, vec![Severity::Warn, Severity::Warn]);
    assert!(state.lock().unwrap().uploads.is_empty());

    handle.abort();
}

#[tokio::test]
async fn identical_content_at_destination_is_deduped_with_a_warn() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"same-bytes");
    let md5 = ferry_infra::hashing::md5_hex(&local).unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state.lock().unwrap().nodes.insert("Backups/a.txt".into(), md5);
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    backend
        .upload_file(&local, "Backups", &UploadOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.completions, vec![Severity::Warn]);
    assert!(hooks.messages[0].contains("already exists"));
    assert!(state.lock().unwrap().uploads.is_empty());

    handle.abort();
}

#[tokio::test]
async fn relocated_duplicate_content_is_an_error_conflict() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"same-bytes");
    let md5 = ferry_infra::hashing::md5_hex(&local).unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state.lock().unwrap().nodes.insert("Elsewhere/copy.txt".into(), md5);
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    backend
        .upload_file(&local, "Backups", &UploadOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.completions, vec![Severity::Error]);
    assert!(state.lock().unwrap().uploads.is_empty());

    handle.abort();
}

#[tokio::test]
async fn force_bypasses_the_dedupe_check() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"same-bytes");
    let md5 = ferry_infra::hashing::md5_hex(&local).unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    state.lock().unwrap().nodes.insert("Backups/a.txt".into(), md5);
    let (addr, handle) = start_server(state.clone()).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    let options = UploadOptions {
        force: true,
        ..UploadOptions::default()
    };
    backend
        .upload_file(&local, "Backups", &options, &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.completions, vec![Severity::Info]);
    assert_eq!(state.lock().unwrap().uploads.len(), 1);

    handle.abort();
}

#[tokio::test]
async fn empty_response_body_logs_an_error_but_resolves() {
    let dir = tempdir().unwrap();
    let local = write_file(&dir, "a.txt", b"payload");

    let state: Shared = Arc::new(Mutex::new(ServerState {
        empty_body_success: true,
        ..ServerState::default()
    }));
    let (addr, handle) = start_server(state).await;

    let backend = backend_for(addr);
    let mut hooks = CountingHooks::default();
    backend
        .upload_file(&local, "Backups", &UploadOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert_eq!(hooks.completions, vec![Severity::Error]);
    assert!(hooks.messages[0].contains("status code 200"));

    handle.abort();
}

#[tokio::test]
async fn directory_upload_mirrors_the_tree_and_filters_ignored_files() {
    let dir = tempdir().unwrap();
    let album = Utf8PathBuf::from_path_buf(dir.path().join("album")).unwrap();
    std::fs::create_dir_all(album.join("sub")).unwrap();
    std::fs::write(album.join("a.txt"), b"aaa").unwrap();
    std::fs::write(album.join(".DS_Store"), b"junk").unwrap();
    std::fs::write(album.join("sub").join("b.txt"), b"bbb").unwrap();

    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    let (addr, handle) = start_server(state.clone()).await;

    let uploader = Uploader::new(Box::new(backend_for(addr)));
    let mut hooks = CountingHooks::default();
    let options = UploadOptions {
        ignore_files: vec![".DS_Store".into()],
        ..UploadOptions::default()
    };
    uploader
        .upload(&[album.clone()], "Backups", &options, &mut hooks)
        .await
        .unwrap();

    let st = state.lock().unwrap();
    let paths: Vec<&str> = st.uploads.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["Backups/album/a.txt", "Backups/album/sub/b.txt"]);
    assert_eq!(hooks.completions, vec![Severity::Info, Severity::Info]);

    handle.abort();
}
