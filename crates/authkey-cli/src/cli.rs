use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "authkey",
    about = "Provision the local shared secret used to authenticate service clients",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Read configuration from this file instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Optional subcommand; defaults to `init` when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ensure the auth key exists and print where it lives.
    Init,
    /// Ensure the auth key exists and print it.
    Show,
    /// Print the resolved key file path without touching it.
    Path,
    /// Check a token against the stored auth key; fails on mismatch.
    Verify {
        /// Token presented by the client.
        token: String,
    },
    /// Initialize the key and confirm it reloads and verifies.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_init_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["authkey"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn parses_show_subcommand() {
        let cli = Cli::try_parse_from(["authkey", "show"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Show));
    }

    #[test]
    fn parses_verify_with_token() {
        let cli =
            Cli::try_parse_from(["authkey", "verify", "abc123"]).expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Verify {
                token: "abc123".into()
            })
        );
    }

    #[test]
    fn verify_requires_token() {
        assert!(Cli::try_parse_from(["authkey", "verify"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["authkey", "path", "--config", "/etc/authkey.toml"])
            .expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Path));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/authkey.toml")));
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["authkey", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }
}
