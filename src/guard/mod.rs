//! Admin access guard: credential check, attempt limiting, timed lockout and
//! session persistence.
//!
//! Flow Overview:
//! 1) `restore_session` loads session and lockout state left by a previous process.
//! 2) `login` refuses every attempt while locked, otherwise checks the Argon2 hash.
//! 3) Each failure bumps the counter; reaching `max_attempts` starts the lockout.
//! 4) Every attempt emits exactly one audit event, delivered without waiting.
//!
//! Lock and session validity are always recomputed from stored timestamps and
//! the clock, so expiry does not depend on a timer having fired.

pub mod clock;
pub use self::clock::{Clock, ManualClock, SystemClock};

pub mod config;
pub use self::config::{ConfigError, GuardConfig};

pub mod countdown;
pub use self::countdown::LockoutCountdown;

pub mod lockout;
pub use self::lockout::LockoutState;

pub mod outcome;
pub use self::outcome::{format_countdown, LoginNotice, LoginOutcome};

pub mod password;

pub mod storage;
pub use self::storage::{FileStore, MemoryStore, StateStore, StoreError};

use self::clock::duration_millis;
use self::storage::{KEY_ADMIN_EMAIL, KEY_LOCKOUT_TIME, KEY_LOGIN_ATTEMPTS, KEY_LOGIN_TIME};
use crate::audit::{AuditEvent, AuditSink};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
    /// Epoch millis of the successful login.
    pub login_timestamp: i64,
}

impl AdminSession {
    /// A login timestamp ahead of `now` is never valid.
    #[must_use]
    pub fn is_valid_at(&self, now: i64, session_duration: Duration) -> bool {
        let age = now.saturating_sub(self.login_timestamp);
        (0..duration_millis(session_duration)).contains(&age)
    }
}

pub struct AdminAccessGuard {
    config: GuardConfig,
    store: Arc<dyn StateStore>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    session: Option<AdminSession>,
    lockout: LockoutState,
}

impl AdminAccessGuard {
    /// Build a guard in the initial `OPEN` state. Call `restore_session` to
    /// pick up persisted state.
    #[must_use]
    pub fn new(config: GuardConfig, store: Arc<dyn StateStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config,
            store,
            audit,
            clock: Arc::new(SystemClock),
            session: None,
            lockout: LockoutState::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Boolean form of [`Self::login`].
    pub fn attempt_login(&mut self, email: &str, password: &str) -> bool {
        self.login(email, password).is_success()
    }

    #[instrument(skip(self, password), fields(admin_email = %email))]
    pub fn login(&mut self, email: &str, password: &str) -> LoginOutcome {
        let now = self.clock.now_millis();
        self.expire_lockout(now);

        if self.lockout.is_locked_at(now, self.config.lockout_duration()) {
            warn!("login refused: account locked");
            self.emit(AuditEvent::attempt_while_locked(email));
            return LoginOutcome::Locked {
                remaining: self.lockout.remaining_at(now, self.config.lockout_duration()),
                just_triggered: false,
            };
        }

        if self.credentials_match(email, password) {
            self.lockout.reset();
            self.session = Some(AdminSession {
                email: email.to_string(),
                login_timestamp: now,
            });
            self.write(KEY_ADMIN_EMAIL, Some(email));
            self.write(KEY_LOGIN_TIME, Some(&now.to_string()));
            self.write(KEY_LOGIN_ATTEMPTS, None);
            self.write(KEY_LOCKOUT_TIME, None);

            info!("admin login succeeded");
            self.emit(AuditEvent::login_success(email));
            return LoginOutcome::Success;
        }

        let triggered = self.lockout.record_failure(now, self.config.max_attempts());
        self.write(
            KEY_LOGIN_ATTEMPTS,
            Some(&self.lockout.attempt_count.to_string()),
        );

        if triggered {
            self.write(KEY_LOCKOUT_TIME, Some(&now.to_string()));
            warn!(
                "account locked for {}s after {} failed attempts",
                self.config.lockout_duration().as_secs(),
                self.lockout.attempt_count
            );
            self.emit(AuditEvent::lockout_triggered(email));
            LoginOutcome::Locked {
                remaining: self.lockout.remaining_at(now, self.config.lockout_duration()),
                just_triggered: true,
            }
        } else {
            info!(
                "invalid credentials ({}/{})",
                self.lockout.attempt_count,
                self.config.max_attempts()
            );
            self.emit(AuditEvent::login_failure(email));
            LoginOutcome::InvalidCredentials {
                remaining_attempts: self.remaining_attempts(),
            }
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lockout
            .is_locked_at(self.clock.now_millis(), self.config.lockout_duration())
    }

    #[must_use]
    pub fn remaining_lockout_time(&self) -> Duration {
        self.lockout
            .remaining_at(self.clock.now_millis(), self.config.lockout_duration())
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.lockout
            .attempts_at(self.clock.now_millis(), self.config.lockout_duration())
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts()
    }

    #[must_use]
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts().saturating_sub(self.attempt_count())
    }

    /// Lockout state as observed now; an elapsed lockout reads as open.
    #[must_use]
    pub fn lockout_state(&self) -> LockoutState {
        let now = self.clock.now_millis();
        if self.lockout.is_expired_at(now, self.config.lockout_duration()) {
            LockoutState::default()
        } else {
            self.lockout
        }
    }

    #[must_use]
    pub fn is_admin_logged_in(&self) -> bool {
        self.session.as_ref().is_some_and(|session| {
            session.is_valid_at(self.clock.now_millis(), self.config.session_duration())
        })
    }

    /// Email of the logged-in admin, `None` when logged out or expired.
    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        if self.is_admin_logged_in() {
            self.session.as_ref().map(|session| session.email.as_str())
        } else {
            None
        }
    }

    /// Start a UI countdown for the current lockout. Requires a tokio runtime.
    #[must_use]
    pub fn countdown(&self, tick: Duration) -> LockoutCountdown {
        LockoutCountdown::start(
            self.lockout_state(),
            self.config.lockout_duration(),
            self.clock.clone(),
            tick,
        )
    }

    /// Load session and lockout state persisted by an earlier process.
    /// Expired or unreadable entries are removed; this never fails.
    #[instrument(skip(self))]
    pub fn restore_session(&mut self) {
        let now = self.clock.now_millis();

        self.session = None;
        let email = self.read(KEY_ADMIN_EMAIL);
        let login_time = self.read(KEY_LOGIN_TIME);
        match (email, login_time) {
            (None, None) => {}
            (Some(email), Some(login_time)) => {
                let session = login_time
                    .parse::<i64>()
                    .ok()
                    .filter(|_| email == self.config.admin_email())
                    .map(|login_timestamp| AdminSession {
                        email,
                        login_timestamp,
                    })
                    .filter(|session| session.is_valid_at(now, self.config.session_duration()));

                if session.is_some() {
                    debug!("admin session restored");
                    self.session = session;
                } else {
                    info!("stored admin session expired");
                    self.clear_session();
                }
            }
            _ => {
                warn!("incomplete stored admin session discarded");
                self.clear_session();
            }
        }

        let lockout_start = match self.read(KEY_LOCKOUT_TIME) {
            Some(raw) => {
                let parsed = raw.parse::<i64>().ok();
                if parsed.is_none() {
                    warn!("unreadable lockout timestamp discarded");
                    self.write(KEY_LOCKOUT_TIME, None);
                }
                parsed
            }
            None => None,
        };
        let attempt_count = self
            .read(KEY_LOGIN_ATTEMPTS)
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(0)
            .min(self.config.max_attempts());

        self.lockout = LockoutState {
            attempt_count,
            lockout_start,
        };
        if self.lockout.is_locked_at(now, self.config.lockout_duration()) {
            self.lockout.attempt_count = self.config.max_attempts();
            debug!(
                "lockout restored, {}s remaining",
                self.remaining_lockout_time().as_secs()
            );
        }
        self.expire_lockout(now);
    }

    /// End the session. Attempt counter and lockout are left untouched.
    #[instrument(skip(self))]
    pub fn logout(&mut self) {
        self.session = None;
        self.clear_session();
        info!("admin logged out");
    }

    fn credentials_match(&self, email: &str, password: &str) -> bool {
        // hash check runs even for a wrong email so both paths cost the same
        let password_ok = password::verify_password(password, self.config.admin_password_hash());
        email == self.config.admin_email() && password_ok
    }

    fn expire_lockout(&mut self, now: i64) {
        if self.lockout.is_expired_at(now, self.config.lockout_duration()) {
            self.lockout.reset();
            self.write(KEY_LOCKOUT_TIME, None);
            self.write(KEY_LOGIN_ATTEMPTS, None);
            info!("lockout expired");
        }
    }

    fn clear_session(&self) {
        self.write(KEY_ADMIN_EMAIL, None);
        self.write(KEY_LOGIN_TIME, None);
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|err| {
            error!("Failed to read {key}: {err}");
            None
        })
    }

    fn write(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.store.set(key, value),
            None => self.store.remove(key),
        };
        if let Err(err) = result {
            error!("Failed to persist {key}: {err}");
        }
    }

    fn emit(&self, event: AuditEvent) {
        let audit = &self.audit;
        if catch_unwind(AssertUnwindSafe(|| audit.record(event))).is_err() {
            error!("audit sink panicked, event dropped");
        }
    }
}
