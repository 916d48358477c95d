use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use ferry_config::{clamp_retries, ConfigStore, Session};
use ferry_core::classify::CompareReport;
use ferry_core::Severity;
use ferry_pipeline::progress::{QuietHooks, TransferHooks};
use ferry_pipeline::sync::{Comparator, HttpBackend, SyncTask, UploadOptions, Uploader};
use tracing::{error, info, warn};

use crate::hooks::ProgressHooks;

fn load_session(store: &ConfigStore) -> Result<Session> {
    store
        .load_session()?
        .ok_or_else(|| anyhow!("Account not authorized. Run `init` first."))
}

fn build_backend(session: &Session) -> Result<HttpBackend> {
    let client = ferry_infra::net::default_http_client().context("Failed to build HTTP client")?;
    Ok(HttpBackend::new(
        client,
        &session.api_url,
        session.token.clone(),
    )?)
}

pub fn cmd_init(api_url: String, token: String) -> Result<()> {
    let store = ConfigStore::new()?;
    store.save_session(&Session { api_url, token })?;
    println!(":: Session saved.");
    Ok(())
}

pub async fn cmd_upload(
    sources: Vec<String>,
    dest: String,
    force: bool,
    overwrite: bool,
) -> Result<()> {
    let store = ConfigStore::new()?;
    let settings = store.load_settings()?;
    let session = load_session(&store)?;

    println!(":: Uploading to '{dest}'");

    let uploader = Uploader::new(Box::new(build_backend(&session)?));
    let options = UploadOptions {
        force,
        overwrite,
        ignore_files: settings.ignore_files.clone(),
        retry_attempt: 0,
        num_retries: clamp_retries(settings.num_retries),
        suppress_dedupe: settings.suppress_dedupe,
    };

    let paths: Vec<Utf8PathBuf> = sources.into_iter().map(Utf8PathBuf::from).collect();

    // Hook implementation is chosen once, up front; the hook bodies never
    // branch on configuration.
    let mut hooks: Box<dyn TransferHooks> = if settings.progress_bars {
        Box::new(ProgressHooks::new(settings.progress_interval_ms))
    } else {
        Box::new(QuietHooks)
    };

    uploader
        .upload(&paths, &dest, &options, hooks.as_mut())
        .await?;
    Ok(())
}

pub async fn cmd_exists(sources: Vec<String>, dest: String) -> Result<()> {
    let store = ConfigStore::new()?;
    let session = load_session(&store)?;

    let comparator = Comparator::new(Box::new(build_backend(&session)?));

    // Sources resolve strictly in order; each fully finishes before the
    // next begins, keeping output interleaving-free.
    for source in sources {
        let task = SyncTask::new(Utf8PathBuf::from(source), &dest)?;
        let mut sink = |report: &CompareReport| print_report(report);
        comparator.compare(&task, &mut sink).await?;
    }
    Ok(())
}

fn print_report(report: &CompareReport) {
    match report.severity() {
        Severity::Info => info!("{}", report.message()),
        Severity::Warn => warn!("{}", report.message()),
        Severity::Error => error!("{}", report.message()),
    }
}

pub fn cmd_config_show() -> Result<()> {
    let store = ConfigStore::new()?;
    let settings = store.load_settings()?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn cmd_config_set(key: &str, value: &str) -> Result<()> {
    let store = ConfigStore::new()?;
    let mut settings = store.load_settings()?;

    match key {
        "progress_bars" => settings.progress_bars = parse_bool(key, value)?,
        "progress_interval_ms" => {
            settings.progress_interval_ms = value
                .parse()
                .with_context(|| format!("'{value}' is not a valid value for {key}"))?;
        }
        "num_retries" => {
            let parsed: u32 = value
                .parse()
                .with_context(|| format!("'{value}' is not a valid value for {key}"))?;
            settings.num_retries = clamp_retries(parsed);
        }
        "suppress_dedupe" => settings.suppress_dedupe = parse_bool(key, value)?,
        "ignore_files" => {
            settings.ignore_files = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        _ => anyhow::bail!("Unknown setting '{key}'"),
    }

    store.save_settings(&settings)?;
    println!(":: Updated {key}.");
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("'{value}' is not a valid value for {key}"))
}
