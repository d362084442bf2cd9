use crate::audit::AuditTrail;
use crate::receiver::{self, ReceiverState};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub audit_log: PathBuf,
    pub api_key: SecretString,
}

/// Execute the serve action.
/// # Errors
/// Returns an error if the receiver fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        audit_log = %args.audit_log.display(),
        "Startup configuration"
    );

    receiver::new(
        args.port,
        ReceiverState {
            trail: AuditTrail::new(args.audit_log),
            api_key: args.api_key,
        },
    )
    .await
}
