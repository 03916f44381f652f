// src/metadata.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Last-checked timestamp per domain
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, domain: &str) -> Option<DateTime<Utc>>;

    /// Record `checked_at` for `domain`, replacing any earlier value
    async fn put(&self, domain: &str, checked_at: DateTime<Utc>) -> Result<()>;
}

/// Format a timestamp the way reports and the metadata file carry it
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// TOML-file-backed store: `"example.com" = "2026-10-14T09:30:00.000Z"`.
/// The whole file is read once on load and rewritten after every put.
pub struct FileMetadataStore {
    path: PathBuf,
    // Held across the file write so concurrent puts are serialized
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileMetadataStore {
    /// Load existing metadata. A missing file starts empty; an unreadable
    /// one is logged and also starts empty.
    pub async fn load(path: PathBuf) -> Self {
        let entries = match Self::read_file(&path).await {
            Ok(Some(entries)) => {
                info!("Loaded last-checked times for {} domains from {:?}", entries.len(), path);
                entries
            }
            Ok(None) => {
                info!("Metadata file {:?} does not exist, starting fresh", path);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable metadata file {:?}: {:#}", path, e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    async fn read_file(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read metadata file")?;

        let entries: BTreeMap<String, String> =
            toml::from_str(&contents).context("Failed to parse metadata file")?;

        Ok(Some(entries))
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        debug!("Saving metadata for {} domains to {:?}", entries.len(), self.path);

        let toml_string =
            toml::to_string(entries).context("Failed to serialize metadata to TOML")?;

        // Write to temporary file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");

        fs::write(&temp_path, toml_string)
            .await
            .context("Failed to write metadata to temporary file")?;

        fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to rename temporary metadata file")?;

        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn get(&self, domain: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.lock().await;
        entries.get(domain).and_then(|v| parse_timestamp(v))
    }

    async fn put(&self, domain: &str, checked_at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(domain.to_string(), format_timestamp(checked_at));
        self.save(&entries).await
    }
}

/// Process-local store with no persistence
#[derive(Default)]
pub struct MemoryMetadataStore {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, domain: &str) -> Option<DateTime<Utc>> {
        self.entries.lock().await.get(domain).copied()
    }

    async fn put(&self, domain: &str, checked_at: DateTime<Utc>) -> Result<()> {
        self.entries.lock().await.insert(domain.to_string(), checked_at);
        Ok(())
    }
}
