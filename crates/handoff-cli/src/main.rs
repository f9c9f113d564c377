mod commands;

use clap::{Parser, Subcommand};
use handoff_core::HandoffConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "handoff", version, about = "Handoff SSO bridge CLI")]
struct Cli {
    /// Path to the configuration file (defaults to $HANDOFF_CONFIG, then handoff.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shared secret management
    Secret {
        #[command(subcommand)]
        cmd: SecretCommand,
    },

    /// Encode, decode and inspect handoff tokens with the configured secret
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Session store maintenance
    Sessions {
        #[command(subcommand)]
        cmd: SessionsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommand {
    /// Generate a random 32-byte shared secret
    Generate {
        /// Write the secret to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Encode an identity assertion created now
    Encode {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        customer_id: Option<String>,
    },

    /// Fully verify a token, freshness included
    Decode {
        /// Token string, or a file containing it
        token: String,
    },

    /// Verify a token's signature and payload, ignoring its age
    Inspect {
        /// Token string, or a file containing it
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    /// Delete expired sessions from the configured store
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Secret { cmd } => match cmd {
            SecretCommand::Generate { output } => commands::secret::generate(output)?,
        },

        Command::Token { cmd } => {
            let config = HandoffConfig::load(cli.config.as_deref())?;
            let codec = commands::load_codec(&config)?;
            match cmd {
                TokenCommand::Encode {
                    email,
                    first_name,
                    last_name,
                    customer_id,
                } => commands::token::encode(&codec, email, first_name, last_name, customer_id)?,
                TokenCommand::Decode { token } => commands::token::decode(&codec, token)?,
                TokenCommand::Inspect { token } => commands::token::inspect(&codec, token)?,
            }
        }

        Command::Sessions { cmd } => {
            let config = HandoffConfig::load(cli.config.as_deref())?;
            match cmd {
                SessionsCommand::Purge => {
                    commands::sessions::purge(&config).await?;
                }
            }
        }
    }

    Ok(())
}
