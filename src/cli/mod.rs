//! CLI module for TeamPulse
//!
//! Subcommands:
//! - `serve`: run the HTTP API (default)
//! - `migrate`: apply or revert database migrations
//! - `create-admin`: create an admin user

pub mod create_admin;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// TeamPulse - football teams and their people
#[derive(Parser)]
#[command(name = "teampulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),

    /// Create an admin user
    CreateAdmin(create_admin::CreateAdminArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["teampulse"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_migrate_revert() {
        let cli = Cli::try_parse_from(["teampulse", "migrate", "--revert"]).unwrap();
        match cli.command {
            Some(Command::Migrate(args)) => assert!(args.revert),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_parse_create_admin() {
        let cli = Cli::try_parse_from([
            "teampulse",
            "create-admin",
            "--email",
            "admin@club.com",
            "--name",
            "Club Admin",
        ])
        .unwrap();

        match cli.command {
            Some(Command::CreateAdmin(args)) => {
                assert_eq!(args.email, "admin@club.com");
                assert_eq!(args.name, "Club Admin");
                assert!(args.password.is_none());
            }
            _ => panic!("expected create-admin"),
        }
    }
}
