use crate::cli::actions::{hash_password, login, logout, serve, status, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Logout(globals) => logout::execute(&globals).await,
        Action::Status(args) => status::execute(args).await,
        Action::HashPassword(args) => hash_password::execute(&args),
        Action::Serve(args) => serve::execute(args).await,
    }
}
