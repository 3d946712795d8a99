use clap::{Parser, Subcommand};

use crate::commands::{
    change_password::ChangePasswordCmd, cleanup::CleanupCmd, create_user::CreateUserCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for recipe book - administration tasks working directly with server data directory."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Creates new user, by default with admin role
    CreateUser(CreateUserCmd),
    /// Sets new password for existing user
    ChangePassword(ChangePasswordCmd),
    /// Removes data not needed anymore
    Cleanup(CleanupCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::ChangePassword(cmd) => cmd.run().await,
            Command::Cleanup(cmd) => cmd.run().await,
        }
    }
}
