use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const BOT_CONTENT_FILE: &str = "botContent.yml";
pub const DIALOG_FILE: &str = "dialog.json";
pub const TRANSCRIPTS_DIR: &str = "Transcripts";

/// A bot export folder holding both the bot definition and a dialog trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFolder {
    pub path: PathBuf,
    pub bot_content: PathBuf,
    pub dialog: PathBuf,
}

impl ExportFolder {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            bail!("Not a directory: {}", path.display());
        }
        let bot_content = path.join(BOT_CONTENT_FILE);
        if !bot_content.exists() {
            bail!("{BOT_CONTENT_FILE} not found in {}", path.display());
        }
        let dialog = path.join(DIALOG_FILE);
        if !dialog.exists() {
            bail!("{DIALOG_FILE} not found in {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            bot_content,
            dialog,
        })
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Subfolders that carry a bot definition, sorted by path.
    pub folders: Vec<PathBuf>,
    /// `Transcripts/*.json` under the parent, sorted by path.
    pub transcripts: Vec<PathBuf>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.transcripts.is_empty()
    }
}

pub fn discover(parent: &Path) -> Result<Discovery> {
    if !parent.exists() {
        bail!("Path does not exist: {}", parent.display());
    }

    let mut folders = Vec::new();
    let entries = stdfs::read_dir(parent)
        .with_context(|| format!("Failed to list {}", parent.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", parent.display()))?
            .path();
        if path.is_dir() && path.join(BOT_CONTENT_FILE).exists() {
            folders.push(path);
        }
    }
    folders.sort();

    let mut transcripts = Vec::new();
    let transcripts_dir = parent.join(TRANSCRIPTS_DIR);
    if transcripts_dir.is_dir() {
        let entries = stdfs::read_dir(&transcripts_dir)
            .with_context(|| format!("Failed to list {}", transcripts_dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", transcripts_dir.display()))?
                .path();
            let is_json = path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
            if path.is_file() && is_json {
                transcripts.push(path);
            }
        }
        transcripts.sort();
    }

    Ok(Discovery {
        folders,
        transcripts,
    })
}

pub async fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
