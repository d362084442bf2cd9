use crate::guard::password::hash_password;
use anyhow::{anyhow, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub password: SecretString,
}

/// Print the PHC hash to stdout so it can be captured into configuration.
/// # Errors
/// Returns an error if hashing fails.
pub fn execute(args: &Args) -> Result<()> {
    let hash = hash_password(&args.password).map_err(|e| anyhow!("Error hashing password: {e}"))?;
    println!("{hash}");
    Ok(())
}
