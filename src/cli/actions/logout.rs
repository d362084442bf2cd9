use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// # Errors
/// Returns an error if the guard cannot be configured.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let mut session = globals.open()?;
    let was_logged_in = session.guard.is_admin_logged_in();
    session.guard.logout();
    session.finish().await;

    if was_logged_in {
        println!("Logged out");
    } else {
        println!("No active admin session");
    }

    Ok(())
}
