use super::password;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 3;
pub const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid admin email: {0}")]
    InvalidEmail(String),
    #[error("admin password hash is not a PHC string: {0}")]
    InvalidPasswordHash(argon2::password_hash::Error),
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Identity and limits for one guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    admin_email: String,
    admin_password_hash: SecretString,
    max_attempts: u32,
    lockout_duration: Duration,
    session_duration: Duration,
}

impl GuardConfig {
    /// # Errors
    /// Returns `ConfigError` if the email is malformed or the hash is not a PHC string.
    pub fn new(
        admin_email: impl Into<String>,
        admin_password_hash: SecretString,
    ) -> Result<Self, ConfigError> {
        let admin_email = admin_email.into();
        if !valid_email(&admin_email) {
            return Err(ConfigError::InvalidEmail(admin_email));
        }
        password::validate_hash(admin_password_hash.expose_secret())
            .map_err(ConfigError::InvalidPasswordHash)?;

        Ok(Self {
            admin_email,
            admin_password_hash,
            max_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_duration: DEFAULT_LOCKOUT_DURATION,
            session_duration: DEFAULT_SESSION_DURATION,
        })
    }

    /// # Errors
    /// Returns `ConfigError::ZeroAttempts` for zero.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    #[must_use]
    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = lockout_duration;
        self
    }

    #[must_use]
    pub fn with_session_duration(mut self, session_duration: Duration) -> Self {
        self.session_duration = session_duration;
        self
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    #[must_use]
    pub fn admin_password_hash(&self) -> &SecretString {
        &self.admin_password_hash
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }

    #[must_use]
    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }
}
