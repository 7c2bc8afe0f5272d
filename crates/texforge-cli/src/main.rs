//! texforge-cli: command-line client for the texforge compilation service.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod compile;

#[cfg(test)]
mod tests;

use clap::Parser;
use texforge_api_types::{HealthResponse, paths};

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use compile::Delivered;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Health => {
            let health: HealthResponse = ctx.get_json(paths::HEALTH).await?;
            println!("{}: {}", health.status, health.message);
        }
        Commands::Compile(args) => match compile::handle(&ctx, args).await? {
            Delivered::Written(path) => println!("wrote {}", path.display()),
            Delivered::Linked(url) => println!("{url}"),
        },
    }

    Ok(())
}
