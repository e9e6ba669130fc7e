//! Fleet operator CLI.

pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), fleet_core::version());
        }
        Commands::LockoutSchedule {
            max_minutes,
            attempts,
        } => commands::lockout_schedule(max_minutes, attempts),
        Commands::HashPassword { password } => commands::hash_password(&password)?,
        Commands::Fingerprint {
            tenant,
            mac,
            public_key,
            hostname,
        } => commands::fingerprint(&tenant, mac, &public_key, &hostname),
        Commands::Drill {
            failures,
            source,
            max_minutes,
        } => commands::drill(failures, &source, max_minutes).await?,
    }

    Ok(())
}
