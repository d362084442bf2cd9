use crate::cli::globals::GlobalArgs;
use crate::guard::LoginOutcome;
use anyhow::{bail, Result};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

/// Run one login attempt against the persisted guard state.
/// # Errors
/// Returns an error carrying the user-facing notice when the login is refused.
pub async fn execute(args: Args) -> Result<()> {
    let mut session = args.globals.open()?;
    let outcome = session
        .guard
        .login(&args.email, args.password.expose_secret());
    session.finish().await;

    match outcome {
        LoginOutcome::Success => {
            println!(
                "Logged in as {}, session valid for {} minutes",
                args.email,
                minutes(args.globals.session_duration)
            );
            Ok(())
        }
        LoginOutcome::Locked {
            just_triggered: true,
            ..
        } => bail!(
            "Too many failed attempts. Account locked for {} minutes.",
            minutes(args.globals.lockout_duration)
        ),
        refused => bail!("{}", refused.notice()),
    }
}

fn minutes(duration: Duration) -> u64 {
    duration.as_secs().div_ceil(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_round_up() {
        assert_eq!(minutes(Duration::from_secs(900)), 15);
        assert_eq!(minutes(Duration::from_secs(61)), 2);
        assert_eq!(minutes(Duration::ZERO), 0);
    }
}
