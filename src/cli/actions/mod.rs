pub mod hash_password;
pub mod login;
pub mod logout;
pub mod serve;
pub mod status;

use crate::cli::globals::GlobalArgs;

// Internal "interpreter" for `Action`.
// The match lives in `run` so this module only declares what can be run.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Logout(GlobalArgs),
    Status(status::Args),
    HashPassword(hash_password::Args),
    Serve(serve::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
