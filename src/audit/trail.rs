//! Append-only audit trail kept by the receiver, one JSON record per line.

use super::AuditEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub event_ip: Option<String>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    #[must_use]
    pub fn stamp(event: AuditEvent, event_ip: Option<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            received_at: Utc::now(),
            event_ip,
            event,
        }
    }
}

#[derive(Debug)]
pub struct AuditTrail {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditTrail {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    /// Returns an error if the record cannot be serialized or written.
    pub async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }

    /// Read every record back, oldest first. A missing trail is empty.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a line is not a record.
    pub async fn records(&self) -> anyhow::Result<Vec<AuditRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}
