//! Trattoria CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! trattoria migrate
//!
//! # Create an account
//! trattoria account create -e ivan@example.com -n "Ivan" -p "correct horse"
//!
//! # Mint an access token for an existing account
//! trattoria token issue -e ivan@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trattoria")]
#[command(author, version, about = "Trattoria CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue an access token for an existing account
    Issue {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create {
                email,
                name,
                password,
            } => {
                commands::account::create(&email, &name, &password).await?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Issue { email } => commands::token::issue(&email).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_account_create() {
        let cli = Cli::try_parse_from([
            "trattoria", "account", "create", "-e", "ivan@example.com", "-n", "Ivan", "-p",
            "password123",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Account {
                action: AccountAction::Create { ref email, .. }
            } if email == "ivan@example.com"
        ));
    }
}
