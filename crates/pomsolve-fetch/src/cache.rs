//! Two-tier workspace cache for artifact bytes and version listings.
//!
//! The memory tier is a concurrent map whose entries expire ten minutes
//! after insertion. The disk tier is unbounded and append-only, backed by a
//! redb store with two tables: `workspace.disk` (coordinate → versions) and
//! `workspace.artifacts` (coordinate → bytes). Disk stores are process-wide
//! singletons keyed by path and live until the process exits.
//!
//! Keys serialize as length-prefixed UTF-8 strings in the order
//! (group, artifact, classifier, extension, version). Version lists carry a
//! 16-bit count; artifact payloads a 32-bit length prefix, since a 16-bit
//! prefix cannot hold a real JAR.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use pomsolve_util::errors::{PomError, PomResult};

use crate::metrics;

/// How long memory-tier entries live after insertion.
const MEMORY_TTL: Duration = Duration::from_secs(10 * 60);

const VERSIONS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("workspace.disk");
const ARTIFACTS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("workspace.artifacts");

static CACHES: Lazy<DashMap<PathBuf, Arc<WorkspaceCache>>> = Lazy::new(DashMap::new);

/// Process-wide cache for a workspace store path. `None` yields a fresh
/// memory-only cache; a path opens (once) a disk-backed store shared by
/// every caller naming the same path.
pub fn for_workspace(path: Option<&Path>) -> PomResult<Arc<WorkspaceCache>> {
    match path {
        Some(path) => match CACHES.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(slot) => {
                let cache = Arc::new(WorkspaceCache::open(path)?);
                slot.insert(cache.clone());
                Ok(cache)
            }
        },
        None => Ok(Arc::new(WorkspaceCache::in_memory())),
    }
}

/// The full identity of a cached artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
    pub version: String,
}

impl ArtifactKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: Option<&str>,
        extension: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: classifier.unwrap_or("").to_string(),
            extension: extension.into(),
            version: version.into(),
        }
    }

    pub fn pom(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self::new(group_id, artifact_id, None, "pom", version)
    }

    pub fn jar(group_id: &str, artifact_id: &str, classifier: Option<&str>, version: &str) -> Self {
        Self::new(group_id, artifact_id, classifier, "jar", version)
    }

    /// Stable binary encoding: each field as a 16-bit length prefix plus
    /// UTF-8 bytes, in (group, artifact, classifier, extension, version)
    /// order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in [
            &self.group_id,
            &self.artifact_id,
            &self.classifier,
            &self.extension,
            &self.version,
        ] {
            put_str(&mut buf, field);
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> PomResult<Self> {
        let mut cursor = 0usize;
        let mut fields = Vec::with_capacity(5);
        for _ in 0..5 {
            fields.push(take_str(bytes, &mut cursor)?);
        }
        if cursor != bytes.len() {
            return Err(corrupt("trailing bytes after artifact key"));
        }
        let mut fields = fields.into_iter();
        Ok(Self {
            group_id: fields.next().unwrap_or_default(),
            artifact_id: fields.next().unwrap_or_default(),
            classifier: fields.next().unwrap_or_default(),
            extension: fields.next().unwrap_or_default(),
            version: fields.next().unwrap_or_default(),
        })
    }
}

/// Two-tier cache: a TTL-bounded concurrent map in front of an optional
/// append-only disk store.
pub struct WorkspaceCache {
    ttl: Duration,
    memory_artifacts: DashMap<ArtifactKey, (Instant, Vec<u8>)>,
    memory_versions: DashMap<ArtifactKey, (Instant, Vec<String>)>,
    disk: Option<Database>,
}

impl WorkspaceCache {
    /// A memory-only cache with the default ten-minute expiration.
    pub fn in_memory() -> Self {
        Self::with_ttl(MEMORY_TTL)
    }

    /// A memory-only cache with a custom expiration.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            memory_artifacts: DashMap::new(),
            memory_versions: DashMap::new(),
            disk: None,
        }
    }

    /// A cache backed by a redb store at `path`, created if absent.
    pub fn open(path: &Path) -> PomResult<Self> {
        let db = Database::create(path).map_err(cache_err)?;
        // make sure both tables exist before the first read
        let txn = db.begin_write().map_err(cache_err)?;
        txn.open_table(VERSIONS_TABLE).map_err(cache_err)?;
        txn.open_table(ARTIFACTS_TABLE).map_err(cache_err)?;
        txn.commit().map_err(cache_err)?;

        Ok(Self {
            ttl: MEMORY_TTL,
            memory_artifacts: DashMap::new(),
            memory_versions: DashMap::new(),
            disk: Some(db),
        })
    }

    /// Cached artifact bytes for a key, consulting memory then disk.
    pub fn lookup(&self, key: &ArtifactKey) -> Option<Vec<u8>> {
        let hit = self.memory_artifacts.get(key).and_then(|entry| {
            let (inserted, bytes) = entry.value();
            (inserted.elapsed() < self.ttl).then(|| bytes.clone())
        });
        if let Some(bytes) = hit {
            return Some(bytes);
        }
        self.memory_artifacts
            .remove_if(key, |_, (inserted, _)| inserted.elapsed() >= self.ttl);

        let bytes = self.disk_read(ARTIFACTS_TABLE, key, decode_payload)?;
        self.memory_artifacts
            .insert(key.clone(), (Instant::now(), bytes.clone()));
        self.publish_sizes();
        Some(bytes)
    }

    /// Store artifact bytes in both tiers.
    pub fn store(&self, key: &ArtifactKey, bytes: &[u8]) -> PomResult<()> {
        self.memory_artifacts
            .insert(key.clone(), (Instant::now(), bytes.to_vec()));
        self.disk_write(ARTIFACTS_TABLE, key, &encode_payload(bytes))?;
        self.publish_sizes();
        Ok(())
    }

    /// Cached version listing for a key.
    pub fn lookup_versions(&self, key: &ArtifactKey) -> Option<Vec<String>> {
        let hit = self.memory_versions.get(key).and_then(|entry| {
            let (inserted, versions) = entry.value();
            (inserted.elapsed() < self.ttl).then(|| versions.clone())
        });
        if let Some(versions) = hit {
            return Some(versions);
        }
        self.memory_versions
            .remove_if(key, |_, (inserted, _)| inserted.elapsed() >= self.ttl);

        let versions = self.disk_read(VERSIONS_TABLE, key, decode_versions)?;
        self.memory_versions
            .insert(key.clone(), (Instant::now(), versions.clone()));
        self.publish_sizes();
        Some(versions)
    }

    /// Store a version listing in both tiers.
    pub fn store_versions(&self, key: &ArtifactKey, versions: &[String]) -> PomResult<()> {
        self.memory_versions
            .insert(key.clone(), (Instant::now(), versions.to_vec()));
        self.disk_write(VERSIONS_TABLE, key, &encode_versions(versions)?)?;
        self.publish_sizes();
        Ok(())
    }

    fn disk_read<T>(
        &self,
        table: TableDefinition<'_, &'static [u8], &'static [u8]>,
        key: &ArtifactKey,
        decode: fn(&[u8]) -> PomResult<T>,
    ) -> Option<T> {
        let db = self.disk.as_ref()?;
        let result = (|| -> PomResult<Option<T>> {
            let txn = db.begin_read().map_err(cache_err)?;
            let table = txn.open_table(table).map_err(cache_err)?;
            match table.get(key.encode().as_slice()).map_err(cache_err)? {
                Some(guard) => Ok(Some(decode(guard.value())?)),
                None => Ok(None),
            }
        })();
        match result {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("disk cache read failed for {key:?}: {err}");
                None
            }
        }
    }

    fn disk_write(
        &self,
        table: TableDefinition<'_, &'static [u8], &'static [u8]>,
        key: &ArtifactKey,
        value: &[u8],
    ) -> PomResult<()> {
        let Some(db) = self.disk.as_ref() else {
            return Ok(());
        };
        let txn = db.begin_write().map_err(cache_err)?;
        {
            let mut table = txn.open_table(table).map_err(cache_err)?;
            table
                .insert(key.encode().as_slice(), value)
                .map_err(cache_err)?;
        }
        txn.commit().map_err(cache_err)
    }

    /// Export per-tier entry counts.
    fn publish_sizes(&self) {
        let memory = self.memory_artifacts.len() + self.memory_versions.len();
        metrics::CACHE_SIZE
            .with_label_values(&["memory"])
            .set(memory as i64);

        if let Some(db) = self.disk.as_ref() {
            let disk_len = (|| -> PomResult<u64> {
                let txn = db.begin_read().map_err(cache_err)?;
                let artifacts = txn.open_table(ARTIFACTS_TABLE).map_err(cache_err)?;
                let versions = txn.open_table(VERSIONS_TABLE).map_err(cache_err)?;
                Ok(artifacts.len().map_err(cache_err)? + versions.len().map_err(cache_err)?)
            })();
            if let Ok(len) = disk_len {
                metrics::CACHE_SIZE.with_label_values(&["disk"]).set(len as i64);
            }
        }
    }
}

fn cache_err(err: impl Display) -> miette::Report {
    PomError::Cache {
        message: err.to_string(),
    }
    .into()
}

fn corrupt(what: &str) -> miette::Report {
    PomError::Cache {
        message: format!("corrupt cache entry: {what}"),
    }
    .into()
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn take_str(bytes: &[u8], cursor: &mut usize) -> PomResult<String> {
    let len_end = cursor.checked_add(2).filter(|&e| e <= bytes.len());
    let Some(len_end) = len_end else {
        return Err(corrupt("truncated string length"));
    };
    let len = u16::from_be_bytes([bytes[*cursor], bytes[*cursor + 1]]) as usize;
    let end = len_end + len;
    if end > bytes.len() {
        return Err(corrupt("truncated string payload"));
    }
    let s = std::str::from_utf8(&bytes[len_end..end])
        .map_err(|_| corrupt("non-UTF-8 string"))?
        .to_string();
    *cursor = end;
    Ok(s)
}

/// Artifact payloads carry a 32-bit length prefix; 16 bits cannot hold a
/// real JAR.
fn encode_payload(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len() + 4);
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
    buf
}

fn decode_payload(raw: &[u8]) -> PomResult<Vec<u8>> {
    if raw.len() < 4 {
        return Err(corrupt("payload shorter than its length prefix"));
    }
    let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    if raw.len() != len + 4 {
        return Err(corrupt("payload length mismatch"));
    }
    Ok(raw[4..].to_vec())
}

fn encode_versions(versions: &[String]) -> PomResult<Vec<u8>> {
    if versions.len() > u16::MAX as usize {
        return Err(corrupt("more versions than a 16-bit count can hold"));
    }
    let mut buf = Vec::new();
    buf.extend_from_slice(&(versions.len() as u16).to_be_bytes());
    for version in versions {
        put_str(&mut buf, version);
    }
    Ok(buf)
}

fn decode_versions(raw: &[u8]) -> PomResult<Vec<String>> {
    if raw.len() < 2 {
        return Err(corrupt("truncated version count"));
    }
    let count = u16::from_be_bytes([raw[0], raw[1]]) as usize;
    let mut cursor = 2usize;
    let mut versions = Vec::with_capacity(count);
    for _ in 0..count {
        versions.push(take_str(raw, &mut cursor)?);
    }
    if cursor != raw.len() {
        return Err(corrupt("trailing bytes after version list"));
    }
    Ok(versions)
}
