use crate::cli::globals::GlobalArgs;
use crate::guard::{format_countdown, AdminAccessGuard, LoginNotice};
use anyhow::Result;
use std::{
    io::{self, Write},
    time::Duration,
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub watch: bool,
}

/// Print session and lockout state, optionally following the lockout countdown.
/// # Errors
/// Returns an error if the guard cannot be configured or stdout is closed.
pub async fn execute(args: Args) -> Result<()> {
    let session = args.globals.open()?;
    let guard = &session.guard;

    println!("{}", session_line(guard));
    println!("{}", lock_line(guard));

    if args.watch && guard.is_locked() {
        let mut countdown = guard.countdown(TICK);
        let mut stdout = io::stdout();
        while let Some(remaining) = countdown.changed().await {
            let notice = LoginNotice::Locked { remaining };
            write!(stdout, "\r{notice}   ")?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        println!("{}", lock_line(guard));
    }

    session.finish().await;

    Ok(())
}

fn session_line(guard: &AdminAccessGuard) -> String {
    match guard.admin_email() {
        Some(email) => format!("session: logged in as {email}"),
        None => "session: logged out".to_string(),
    }
}

fn lock_line(guard: &AdminAccessGuard) -> String {
    if guard.is_locked() {
        format!(
            "lockout: locked, retry in {}",
            format_countdown(guard.remaining_lockout_time())
        )
    } else {
        format!(
            "lockout: open, {}/{} failed attempts",
            guard.attempt_count(),
            guard.max_attempts()
        )
    }
}
