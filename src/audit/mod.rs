//! Audit events for the admin login flow and the sinks that carry them.
//!
//! Sinks are fire-and-forget: `record` returns immediately and delivery
//! failures never reach the caller.

pub mod http;
pub use self::http::{AuditError, HttpAuditSink};

pub mod trail;
pub use self::trail::{AuditRecord, AuditTrail};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LoginAttempt,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventResult {
    Success,
    Failure,
    Locked,
}

impl fmt::Display for EventResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Locked => "locked",
        };
        f.write_str(result)
    }
}

/// One login-flow occurrence. The receiver adds time and source IP.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub event_result: EventResult,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub event_description: Option<String>,
}

impl AuditEvent {
    fn login(result: EventResult, email: &str, description: &str) -> Self {
        Self {
            event_type: EventType::LoginAttempt,
            event_result: result,
            admin_email: Some(email.to_string()),
            event_description: Some(description.to_string()),
        }
    }

    #[must_use]
    pub fn login_success(email: &str) -> Self {
        Self::login(EventResult::Success, email, "Successful admin login (password correct).")
    }

    #[must_use]
    pub fn login_failure(email: &str) -> Self {
        Self::login(EventResult::Failure, email, "Invalid credentials.")
    }

    #[must_use]
    pub fn lockout_triggered(email: &str) -> Self {
        Self::login(
            EventResult::Locked,
            email,
            "Account locked due to too many failed attempts.",
        )
    }

    #[must_use]
    pub fn attempt_while_locked(email: &str) -> Self {
        Self::login(
            EventResult::Locked,
            email,
            "Login attempt while account is locked.",
        )
    }
}

pub trait AuditSink: Send + Sync {
    /// Hand off one event. Must not block and must not fail.
    fn record(&self, event: AuditEvent);
}

/// Writes events to the local log when no audit endpoint is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        info!(
            event_type = "login_attempt",
            event_result = %event.event_result,
            admin_email = event.admin_email.as_deref().unwrap_or_default(),
            "{}",
            event.event_description.as_deref().unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_wire_format() -> Result<(), serde_json::Error> {
        let event = AuditEvent::lockout_triggered("x@example.com");
        assert_eq!(
            serde_json::to_value(&event)?,
            json!({
                "event_type": "login_attempt",
                "event_result": "locked",
                "admin_email": "x@example.com",
                "event_description": "Account locked due to too many failed attempts.",
            })
        );
        Ok(())
    }

    #[test]
    fn success_description() {
        assert_eq!(
            AuditEvent::login_success("a").event_description.as_deref(),
            Some("Successful admin login (password correct).")
        );
    }

    #[test]
    fn optional_fields_may_be_omitted() -> Result<(), serde_json::Error> {
        let event: AuditEvent =
            serde_json::from_value(json!({"event_type": "login_attempt", "event_result": "failure"}))?;
        assert_eq!(event.event_result, EventResult::Failure);
        assert_eq!(event.admin_email, None);
        assert_eq!(event.event_description, None);
        Ok(())
    }

    #[test]
    fn unknown_result_is_rejected() {
        let parsed: Result<AuditEvent, _> = serde_json::from_value(
            json!({"event_type": "login_attempt", "event_result": "maybe"}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn constructors_pick_results() {
        assert_eq!(
            AuditEvent::login_success("a").event_result,
            EventResult::Success
        );
        assert_eq!(
            AuditEvent::login_failure("a").event_result,
            EventResult::Failure
        );
        assert_eq!(
            AuditEvent::attempt_while_locked("a").event_result,
            EventResult::Locked
        );
        assert_eq!(EventResult::Locked.to_string(), "locked");
    }

    #[test]
    fn log_sink_accepts_events() {
        LogAuditSink.record(AuditEvent::login_failure("a@example.com"));
    }
}
