//! Map validated CLI matches to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, logging, ARG_DSN, ARG_KEYGEN, ARG_PORT};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if matches.get_flag(ARG_KEYGEN) {
        return Ok(Action::Keygen);
    }

    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let environment = matches
        .get_one::<String>(logging::ARG_ENVIRONMENT)
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        environment,
        paseto_secret_key: auth_opts.paseto_secret_key,
        token_ttl_minutes: auth_opts.token_ttl_minutes,
        code_ttl_seconds: auth_opts.code_ttl_seconds,
        token_issuer: auth_opts.token_issuer,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn server_action_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("XPOSE_DSN", Some("memory://")),
                ("XPOSE_PASETO_SECRET_KEY", Some("abcd")),
                ("XPOSE_PORT", None),
                ("XPOSE_TOKEN_TTL_MINUTES", Some("5")),
                ("XPOSE_ENVIRONMENT", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["xpose"]);
                let Action::Server(args) = handler(&matches)? else {
                    anyhow::bail!("expected server action");
                };
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "memory://");
                assert_eq!(args.environment, "development");
                assert_eq!(args.paseto_secret_key.expose_secret(), "abcd");
                assert_eq!(args.token_ttl_minutes, 5);
                Ok(())
            },
        )
    }

    #[test]
    fn keygen_action() -> Result<()> {
        temp_env::with_vars(
            [("XPOSE_DSN", None::<&str>), ("XPOSE_PASETO_SECRET_KEY", None)],
            || {
                let matches =
                    crate::cli::commands::new().get_matches_from(vec!["xpose", "--keygen"]);
                assert!(matches!(handler(&matches)?, Action::Keygen));
                Ok(())
            },
        )
    }
}
