use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tokio::fs;

use crate::formats::ChapterRecord;

pub const LEDGER_FILE_NAME: &str = "translated_data.json";

/// Append-only record of chapters that already have pages, keyed by id.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    records: Vec<ChapterRecord>,
}

impl Ledger {
    /// Loads the ledger at `path`. A missing file is an empty ledger.
    pub async fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let loaded: Vec<ChapterRecord> = read_json(&path)
            .await
            .with_context(|| format!("read ledger: {}", path.display()))?
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(loaded.len());
        for record in loaded {
            if !seen.insert(record.id.clone()) {
                tracing::warn!(id = %record.id, "duplicate ledger record; keeping the first");
                continue;
            }
            records.push(record);
        }

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChapterRecord] {
        &self.records
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|record| record.id == id)
    }

    /// Appends `record` and persists the ledger. Returns `false` without
    /// touching anything when the id is already recorded.
    pub async fn append(&mut self, record: ChapterRecord) -> anyhow::Result<bool> {
        if self.contains(&record.id) {
            return Ok(false);
        }

        let mut next = self.records.clone();
        next.push(record);
        next.sort_by(|a, b| compare_dates_desc(&a.date, &b.date));

        // Memory only changes once the file is replaced.
        write_json_atomic(&self.path, &next)
            .await
            .with_context(|| format!("write ledger: {}", self.path.display()))?;
        self.records = next;
        Ok(true)
    }

    /// Records ordered by publish date, newest first. Records whose date does
    /// not parse come last, in their current order.
    pub fn sorted_by_date(&self) -> Vec<&ChapterRecord> {
        let mut sorted = self.records.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| compare_dates_desc(&a.date, &b.date));
        sorted
    }
}

fn compare_dates_desc(a: &str, b: &str) -> Ordering {
    match (parse_publish_date(a), parse_publish_date(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parses a listing date label such as `2024/05/10 21:00（改）`.
pub fn parse_publish_date(label: &str) -> Option<NaiveDateTime> {
    let label = label
        .split(['（', '('])
        .next()
        .unwrap_or_default()
        .trim();
    if label.is_empty() {
        return None;
    }

    for format in ["%Y/%m/%d %H:%M", "%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(label, format) {
            return Some(parsed);
        }
    }
    for format in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(label, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(label)
        .ok()
        .map(|parsed| parsed.naive_utc())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    let result = async {
        fs::write(&tmp_path, &data)
            .await
            .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("rename tmp to final: {}", path.display()))
    }
    .await;

    if result.is_err()
        && let Err(err) = fs::remove_file(&tmp_path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(?err, path = %tmp_path.display(), "failed to remove temporary ledger file");
    }
    result
}
