//! # Adminguard (Admin Access Guard)
//!
//! `adminguard` gates access to an administrative surface behind a single
//! configured admin identity. It verifies credentials, counts consecutive
//! failures, enforces a timed lockout, keeps a time-bounded session, and emits
//! an audit event for every login attempt.
//!
//! ## Lockout State Machine
//!
//! ```text
//! OPEN --(failures reach max_attempts)--> LOCKED --(lockout elapses)--> OPEN
//! OPEN --(successful login)--> OPEN (counter reset)
//! ```
//!
//! The lock is always computed from the persisted lockout timestamp and the
//! current clock reading. Timers (see [`guard::LockoutCountdown`]) only refresh
//! what a user sees; they never mutate state, so a lockout written by a
//! previous process still expires on time.
//!
//! ## Persistence
//!
//! Session and lockout state live in a [`guard::StateStore`] under the keys
//! `adminEmail`, `adminLoginTime`, `adminLoginAttempts` and `adminLockoutTime`.
//! Writes complete before `login` returns, so a restart right after a call
//! observes consistent state.
//!
//! ## Audit Trail
//!
//! Every attempt produces exactly one [`audit::AuditEvent`], handed to an
//! [`audit::AuditSink`] without waiting for delivery. The [`receiver`] module
//! is the HTTP endpoint that accepts these events, stamps them with the
//! observed time and client IP, and appends them to an append-only trail.

pub mod audit;
pub mod cli;
pub mod guard;
pub mod receiver;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
