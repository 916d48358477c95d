use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const QUALIFIER: &str = "io";
const ORG: &str = "ferry";
const APP: &str = "drive";

/// User-adjustable knobs persisted as `settings.json` in the config dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base-name patterns skipped during directory uploads.
    pub ignore_files: Vec<String>,
    /// Render live progress bars during uploads.
    pub progress_bars: bool,
    /// Milliseconds between progress redraws.
    pub progress_interval_ms: u64,
    /// Backend-internal retry cycles per file.
    pub num_retries: u32,
    /// Suppress the pre-upload duplicate check.
    pub suppress_dedupe: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore_files: vec![".DS_Store".into(), "Thumbs.db".into(), "*.tmp".into()],
            progress_bars: true,
            progress_interval_ms: crate::DEFAULT_PROGRESS_INTERVAL_MS,
            num_retries: crate::DEFAULT_NUM_RETRIES,
            suppress_dedupe: false,
        }
    }
}

/// Stored account session written by `init`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub api_url: String,
    pub token: String,
}

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from(QUALIFIER, ORG, APP)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self {
            dir: proj_dirs.config_dir().to_path_buf(),
        })
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).context("Failed to create config directory")?;
        }
        Ok(())
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join("settings.json")
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&path).context("Failed to read settings")?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(settings)?;
        atomic_write(&self.settings_path(), json.as_bytes()).context("Failed to write settings")
    }

    /// Returns `None` when no account has been initialized yet.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).context("Failed to read session")?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(session)?;
        atomic_write(&self.session_path(), json.as_bytes()).context("Failed to write session")
    }
}

fn atomic_write(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file {}", tmp_path.to_string_lossy()))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write temp file {}", tmp_path.to_string_lossy()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {}", tmp_path.to_string_lossy()))?;
    drop(file);

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename temp file {} to {}",
            tmp_path.to_string_lossy(),
            path.to_string_lossy()
        )
    })
}
