//! CLI argument parsing and command dispatch.

pub mod args;

use std::time::Duration;

use serde_json::{Value, json};

pub use args::{AnalyzeArgs, Cli, Commands, ListArgs};

use crate::client::{Client, ClientConfig};
use crate::core::auth::Credentials;
use crate::core::models::{AnalysisRequest, ListFilter};
use crate::core::poller::PollOptions;
use crate::error::{Error, Result};

/// Resolve credentials from CLI flags / environment.
///
/// Precedence: API key, then email+password, then ethAddress+password,
/// then the trial account.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an identity without a password (or
/// vice versa).
pub fn resolve_credentials(cli: &Cli) -> Result<Credentials> {
    if let Some(key) = &cli.api_key {
        return Ok(Credentials::ApiKey(key.clone()));
    }
    match (&cli.email, &cli.eth_address, &cli.password) {
        (Some(email), _, Some(password)) => Ok(Credentials::EmailPassword {
            email: email.clone(),
            password: password.clone(),
        }),
        (None, Some(address), Some(password)) => Ok(Credentials::EthAddress {
            address: address.clone(),
            password: password.clone(),
        }),
        (Some(_), _, None) | (None, Some(_), None) => Err(Error::Validation(
            "a password is required with --email or --eth-address \
             (or set OPSCAN_PASSWORD)"
                .to_string(),
        )),
        (None, None, Some(_)) => Err(Error::Validation(
            "--password requires --email or --eth-address".to_string(),
        )),
        (None, None, None) => {
            tracing::warn!("no credentials supplied; using the trial account (demo quota)");
            Ok(Credentials::Trial)
        }
    }
}

/// Execute the parsed CLI command.
///
/// # Errors
///
/// Propagates client errors; the binary maps them to exit codes.
pub async fn run(cli: Cli) -> Result<()> {
    let credentials = resolve_credentials(&cli)?;
    let config = ClientConfig::new(&cli.api_url, credentials)?;
    let client = Client::new(config)?;

    let output = match cli.command {
        Commands::Analyze(ref args) => {
            let request = analysis_request_from(args)?;
            let options = PollOptions {
                timeout: Duration::from_secs(args.timeout),
                initial_delay: Duration::from_millis(args.initial_delay),
            };
            client.analyze_with_options(&request, options).await?
        }

        Commands::Status { ref uuid } => {
            let status = client.status(uuid).await?;
            json!({ "uuid": uuid, "status": status.as_str() })
        }

        Commands::Issues { ref uuid } => client.issues(uuid).await?,

        Commands::List(ref args) => {
            let filter = ListFilter {
                date_from: args.date_from,
                date_to: args.date_to,
                offset: args.offset,
            };
            client.list_analyses(&filter).await?
        }

        Commands::Version => client.api_version().await?,
    };

    print_json(&output);
    Ok(())
}

fn analysis_request_from(args: &AnalyzeArgs) -> Result<AnalysisRequest> {
    if let Some(bytecode) = &args.bytecode {
        return AnalysisRequest::from_bytecode(bytecode.clone());
    }
    if let Some(path) = &args.bytecode_file {
        let bytecode = std::fs::read_to_string(path)?;
        return AnalysisRequest::from_bytecode(bytecode.trim().to_string());
    }
    Err(Error::Validation(
        "provide --bytecode or --bytecode-file".to_string(),
    ))
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(_) => println!("{value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_from(argv: &[&str]) -> Cli {
        Cli::parse_from(argv)
    }

    #[test]
    fn api_key_takes_precedence() {
        let cli = cli_from([
            "opscan",
            "version",
            "--api-key",
            "key-1",
            "--email",
            "a@b.c",
            "--password",
            "pw",
        ]
        .as_ref());
        assert!(matches!(
            resolve_credentials(&cli).unwrap(),
            Credentials::ApiKey(key) if key == "key-1"
        ));
    }

    #[test]
    fn email_without_password_is_rejected() {
        let cli = cli_from(["opscan", "version", "--email", "a@b.c"].as_ref());
        assert!(matches!(
            resolve_credentials(&cli),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn no_credentials_falls_back_to_trial() {
        let cli = cli_from(["opscan", "version"].as_ref());
        assert!(matches!(
            resolve_credentials(&cli).unwrap(),
            Credentials::Trial
        ));
    }

    #[test]
    fn eth_address_with_password_resolves() {
        let cli = cli_from([
            "opscan",
            "version",
            "--eth-address",
            "0x1234",
            "--password",
            "pw",
        ]
        .as_ref());
        assert!(matches!(
            resolve_credentials(&cli).unwrap(),
            Credentials::EthAddress { address, .. } if address == "0x1234"
        ));
    }
}
