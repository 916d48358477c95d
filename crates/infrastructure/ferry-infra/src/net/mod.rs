use camino::Utf8Path;
use futures::SinkExt;
use reqwest::{Client, Url};
use tokio::io::AsyncReadExt;

/// Bytes read per chunk when streaming an upload body.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upload task failed: {0}")]
    Task(String),
}

/// Transport response for one transfer attempt.
#[derive(Debug, Clone)]
pub struct StreamResponse {
    pub status: u16,
    pub body: String,
}

/// Shared HTTP client with sane defaults for drive API calls.
pub fn default_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
}

/// PUT a file as a chunk-streamed request body, invoking `on_chunk` with
/// each chunk's length as it is handed to the transport.
///
/// The request future runs on its own task while this function feeds the
/// body channel; a bounded channel keeps at most a few chunks in flight.
/// `Io` failures come from the local file, `Http` failures from transport.
pub async fn upload_stream<F>(
    client: &Client,
    url: Url,
    token: &str,
    local_path: &Utf8Path,
    mut on_chunk: F,
) -> Result<StreamResponse, NetError>
where
    F: FnMut(u64),
{
    let mut file = tokio::fs::File::open(local_path.as_std_path()).await?;

    let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Vec<u8>, std::io::Error>>(4);
    let body = reqwest::Body::wrap_stream(rx);
    let pending = tokio::spawn(client.put(url).bearer_auth(token).body(body).send());

    let mut buf = vec![0u8; UPLOAD_CHUNK_BYTES];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
            // Receiver dropped: the request already finished; its result
            // is surfaced below.
            tracing::debug!("upload body channel closed early for {local_path}");
            break;
        }
        on_chunk(n as u64);
    }
    drop(tx);

    let resp = pending
        .await
        .map_err(|e| NetError::Task(e.to_string()))??;

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Ok(StreamResponse { status, body })
}
