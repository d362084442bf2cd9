use std::{fmt, time::Duration};

/// Result of one login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials {
        remaining_attempts: u32,
    },
    /// `just_triggered` is true only for the failure that started the lockout.
    Locked {
        remaining: Duration,
        just_triggered: bool,
    },
}

impl LoginOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub fn notice(&self) -> LoginNotice {
        match *self {
            Self::Success => LoginNotice::None,
            Self::InvalidCredentials { remaining_attempts } => {
                LoginNotice::InvalidCredentials { remaining_attempts }
            }
            Self::Locked { remaining, .. } => LoginNotice::Locked { remaining },
        }
    }
}

/// The single message a login form shows at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginNotice {
    None,
    InvalidCredentials { remaining_attempts: u32 },
    Locked { remaining: Duration },
}

impl fmt::Display for LoginNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::InvalidCredentials {
                remaining_attempts: 1,
            } => write!(f, "Invalid credentials. 1 attempt remaining."),
            Self::InvalidCredentials { remaining_attempts } => {
                write!(f, "Invalid credentials. {remaining_attempts} attempts remaining.")
            }
            Self::Locked { remaining } => {
                write!(f, "Account locked. Try again in {}", format_countdown(*remaining))
            }
        }
    }
}

/// `M:SS`, minutes unpadded, seconds rounded down.
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
