use crate::audit::{AuditSink, HttpAuditSink, LogAuditSink};
use crate::guard::{AdminAccessGuard, FileStore, GuardConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::debug;

const AUDIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Guard settings shared by every guard-backed subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub state_file: PathBuf,
    pub admin_email: String,
    pub admin_password_hash: SecretString,
    pub max_attempts: u32,
    pub lockout_duration: Duration,
    pub session_duration: Duration,
    pub audit_url: Option<String>,
    pub audit_api_key: Option<SecretString>,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if the admin identity or limits are invalid.
    pub fn guard_config(&self) -> Result<GuardConfig> {
        let config = GuardConfig::new(self.admin_email.clone(), self.admin_password_hash.clone())
            .context("invalid admin identity")?
            .with_max_attempts(self.max_attempts)?
            .with_lockout_duration(self.lockout_duration)
            .with_session_duration(self.session_duration);
        Ok(config)
    }

    /// Build the guard, restore persisted state, and wire the audit sink.
    /// # Errors
    /// Returns an error if the configuration or audit endpoint is invalid.
    pub fn open(&self) -> Result<GuardSession> {
        let config = self.guard_config()?;
        let store = Arc::new(FileStore::new(&self.state_file));

        let http = match &self.audit_url {
            Some(url) => Some(Arc::new(
                HttpAuditSink::new(url, self.audit_api_key.clone())
                    .context("invalid --audit-url")?,
            )),
            None => None,
        };
        let sink: Arc<dyn AuditSink> = match &http {
            Some(http) => http.clone(),
            None => Arc::new(LogAuditSink),
        };

        debug!("state file: {}", self.state_file.display());

        let mut guard = AdminAccessGuard::new(config, store, sink);
        guard.restore_session();

        Ok(GuardSession { guard, http })
    }
}

/// A restored guard plus the handle needed to drain audit deliveries on exit.
pub struct GuardSession {
    pub guard: AdminAccessGuard,
    http: Option<Arc<HttpAuditSink>>,
}

impl GuardSession {
    pub async fn finish(self) {
        if let Some(http) = self.http {
            http.flush(AUDIT_FLUSH_TIMEOUT).await;
        }
    }
}
