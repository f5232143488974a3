use clap::{Parser, Subcommand};
use pdash_db::storage::mongodb::MongoDBStorage;

use crate::commands::SetPasswordParams;

mod commands;

/// Operator tool for a phoenixd dashboard's storage.
#[derive(Parser)]
pub struct Args {
    #[clap(subcommand)]
    command: Command,

    #[clap(
        short = 'D',
        long,
        env = "PDASH_DATABASE_URI",
        default_value = "mongodb://localhost:27017/phoenixd_dashboard"
    )]
    database_uri: String,
}

#[derive(Clone, Subcommand)]
pub enum Command {
    /// Remove the dashboard password and end every session.
    #[command(name = "reset-password")]
    ResetPassword,

    /// Replace the dashboard password and end every session.
    #[command(name = "set-password")]
    SetPassword(SetPasswordParams),

    /// End every session without touching the password.
    #[command(name = "clear-sessions")]
    ClearSessions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let stg = MongoDBStorage::new(&args.database_uri).await?;

    match args.command {
        Command::ResetPassword => commands::reset_password(&stg).await,
        Command::SetPassword(params) => commands::set_password(&stg, params).await,
        Command::ClearSessions => commands::clear_sessions(&stg).await,
    }
}
