use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn guard_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("state-file")
                .long("state-file")
                .help("File holding session and lockout state")
                .default_value(".adminguard/state.json")
                .env("ADMINGUARD_STATE_FILE")
                .global(true),
        )
        .arg(
            Arg::new("admin-email")
                .long("admin-email")
                .help("The admin identity")
                .env("ADMINGUARD_ADMIN_EMAIL")
                .global(true),
        )
        .arg(
            Arg::new("admin-password-hash")
                .long("admin-password-hash")
                .help("Argon2 PHC hash of the admin password, see `hash-password`")
                .env("ADMINGUARD_ADMIN_PASSWORD_HASH")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .help("Consecutive failures before lockout")
                .default_value("3")
                .env("ADMINGUARD_MAX_ATTEMPTS")
                .value_parser(clap::value_parser!(u32).range(1..))
                .global(true),
        )
        .arg(
            Arg::new("lockout-seconds")
                .long("lockout-seconds")
                .help("Lockout duration in seconds")
                .default_value("900")
                .env("ADMINGUARD_LOCKOUT_SECONDS")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("session-seconds")
                .long("session-seconds")
                .help("Admin session duration in seconds")
                .default_value("7200")
                .env("ADMINGUARD_SESSION_SECONDS")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("audit-url")
                .long("audit-url")
                .help("Audit receiver endpoint, example: https://audit.tld/log-admin-access")
                .env("ADMINGUARD_AUDIT_URL")
                .global(true),
        )
        .arg(
            Arg::new("audit-api-key")
                .long("audit-api-key")
                .help("Shared key sent in the apikey header")
                .env("ADMINGUARD_AUDIT_API_KEY")
                .hide_env_values(true)
                .global(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("adminguard")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("login")
                .about("Attempt an admin login")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Email to log in with")
                        .env("ADMINGUARD_LOGIN_EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password to log in with")
                        .env("ADMINGUARD_LOGIN_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("End the admin session"))
        .subcommand(
            Command::new("status")
                .about("Show session and lockout state")
                .arg(
                    Arg::new("watch")
                        .short('w')
                        .long("watch")
                        .help("Follow the lockout countdown until it ends")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("hash-password")
                .about("Print an Argon2 hash for --admin-password-hash")
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password to hash")
                        .env("ADMINGUARD_NEW_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the audit receiver")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port to listen on")
                        .default_value("8080")
                        .env("ADMINGUARD_PORT")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    Arg::new("audit-log")
                        .long("audit-log")
                        .help("Append-only audit trail (JSON lines)")
                        .default_value("audit.jsonl")
                        .env("ADMINGUARD_AUDIT_LOG"),
                )
                .arg(
                    Arg::new("api-key")
                        .long("api-key")
                        .help("Shared key callers must send in the apikey header")
                        .env("ADMINGUARD_RECEIVER_API_KEY")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ADMINGUARD_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        );

    guard_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "adminguard");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_debug_assert() {
        new().debug_assert();
    }

    #[test]
    fn test_check_login_args() {
        temp_env::with_vars(
            [
                ("ADMINGUARD_LOGIN_EMAIL", None::<String>),
                ("ADMINGUARD_LOGIN_PASSWORD", None::<String>),
                ("ADMINGUARD_MAX_ATTEMPTS", None::<String>),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "adminguard",
                    "--admin-email",
                    "admin@example.com",
                    "login",
                    "--email",
                    "x@example.com",
                    "--password",
                    "secret",
                    "--state-file",
                    "/tmp/state.json",
                ]);

                let (name, sub) = matches.subcommand().unwrap();
                assert_eq!(name, "login");
                assert_eq!(
                    sub.get_one::<String>("email").cloned(),
                    Some("x@example.com".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>("password").cloned(),
                    Some("secret".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>("admin-email").cloned(),
                    Some("admin@example.com".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>("state-file").cloned(),
                    Some("/tmp/state.json".to_string())
                );
                assert_eq!(sub.get_one::<u32>("max-attempts").copied(), Some(3));
            },
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = new().try_get_matches_from(vec!["adminguard", "--max-attempts", "0", "logout"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ADMINGUARD_PORT", Some("443")),
                ("ADMINGUARD_AUDIT_LOG", Some("/var/log/audit.jsonl")),
                ("ADMINGUARD_RECEIVER_API_KEY", Some("key")),
                ("ADMINGUARD_LOCKOUT_SECONDS", Some("60")),
                ("ADMINGUARD_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["adminguard", "serve"]);
                let (name, sub) = matches.subcommand().unwrap();
                assert_eq!(name, "serve");
                assert_eq!(sub.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    sub.get_one::<String>("audit-log").cloned(),
                    Some("/var/log/audit.jsonl".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>("api-key").cloned(),
                    Some("key".to_string())
                );
                assert_eq!(sub.get_one::<u64>("lockout-seconds").copied(), Some(60));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("ADMINGUARD_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["adminguard", "logout"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(u8::try_from(index).unwrap_or(u8::MAX))
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("ADMINGUARD_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["adminguard".to_string(), "status".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(u8::try_from(index).unwrap_or(u8::MAX))
                );
            });
        }
    }
}
