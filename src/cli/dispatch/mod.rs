use crate::cli::actions::{hash_password, login, serve, status, Action};
use crate::cli::globals::GlobalArgs;
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

/// # Errors
/// Returns an error if a required argument is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("login", sub_m)) => Ok(Action::Login(login::Args {
            globals: globals(sub_m)?,
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
        })),
        Some(("logout", sub_m)) => Ok(Action::Logout(globals(sub_m)?)),
        Some(("status", sub_m)) => Ok(Action::Status(status::Args {
            globals: globals(sub_m)?,
            watch: sub_m.get_flag("watch"),
        })),
        Some(("hash-password", sub_m)) => Ok(Action::HashPassword(hash_password::Args {
            password: SecretString::from(required(sub_m, "password")?),
        })),
        Some(("serve", sub_m)) => Ok(Action::Serve(serve::Args {
            port: sub_m.get_one::<u16>("port").copied().unwrap_or(8080),
            audit_log: PathBuf::from(required(sub_m, "audit-log")?),
            api_key: SecretString::from(required(sub_m, "api-key")?),
        })),
        Some((name, _)) => bail!("unknown subcommand: {name}"),
        None => bail!("missing subcommand"),
    }
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    Ok(GlobalArgs {
        state_file: PathBuf::from(required(matches, "state-file")?),
        admin_email: required(matches, "admin-email")?,
        admin_password_hash: SecretString::from(required(matches, "admin-password-hash")?),
        max_attempts: matches.get_one::<u32>("max-attempts").copied().unwrap_or(3),
        lockout_duration: Duration::from_secs(
            matches
                .get_one::<u64>("lockout-seconds")
                .copied()
                .unwrap_or(900),
        ),
        session_duration: Duration::from_secs(
            matches
                .get_one::<u64>("session-seconds")
                .copied()
                .unwrap_or(7200),
        ),
        audit_url: matches.get_one::<String>("audit-url").cloned(),
        audit_api_key: matches
            .get_one::<String>("audit-api-key")
            .cloned()
            .map(SecretString::from),
    })
}
