use super::{AuditEvent, AuditSink};
use crate::APP_USER_AGENT;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Mutex, time::Duration};
use tokio::{runtime::Handle, task::JoinSet};
use tracing::{debug, error, instrument, warn};
use url::Url;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("invalid audit endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("audit endpoint must be http or https, got {0}")]
    Scheme(String),
    #[error("audit transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("audit endpoint answered {0}")]
    Status(reqwest::StatusCode),
}

/// Posts events to the audit receiver on background tasks.
#[derive(Debug)]
pub struct HttpAuditSink {
    client: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    in_flight: Mutex<JoinSet<()>>,
}

impl HttpAuditSink {
    /// # Errors
    /// Returns an error if the endpoint is not an http(s) URL or the client cannot be built.
    pub fn new(endpoint: &str, api_key: Option<SecretString>) -> Result<Self, AuditError> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AuditError::Scheme(endpoint.scheme().to_string()));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DELIVERY_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            in_flight: Mutex::new(JoinSet::new()),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Wait for in-flight deliveries, giving up after `timeout`.
    ///
    /// Only for process teardown: a CLI invocation exits right after the
    /// login, which would otherwise drop pending tasks with the runtime.
    pub async fn flush(&self, timeout: Duration) {
        let mut pending = match self.in_flight.lock() {
            Ok(mut set) => std::mem::take(&mut *set),
            Err(_) => return,
        };

        let drained = tokio::time::timeout(timeout, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!("audit flush timed out, {} deliveries abandoned", pending.len());
        }
    }
}

impl AuditSink for HttpAuditSink {
    fn record(&self, event: AuditEvent) {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime, audit event dropped");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        match self.in_flight.lock() {
            Ok(mut set) => {
                // reap finished deliveries so the set does not grow without bound
                while set.try_join_next().is_some() {}
                set.spawn_on(deliver(client, endpoint, api_key, event), &handle);
            }
            Err(_) => {
                handle.spawn(deliver(client, endpoint, api_key, event));
            }
        }
    }
}

#[instrument(skip_all, fields(event_result = %event.event_result))]
async fn deliver(client: Client, endpoint: Url, api_key: Option<SecretString>, event: AuditEvent) {
    match send(&client, endpoint, api_key.as_ref(), &event).await {
        Ok(()) => debug!("audit event delivered"),
        Err(err) => error!("Admin audit log failed: {err}"),
    }
}

async fn send(
    client: &Client,
    endpoint: Url,
    api_key: Option<&SecretString>,
    event: &AuditEvent,
) -> Result<(), AuditError> {
    let mut request = client.post(endpoint).json(event);
    if let Some(key) = api_key {
        request = request.header("apikey", key.expose_secret());
    }

    let response = request.send().await?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(AuditError::Status(response.status()))
    }
}
