//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], [`validate`], or [`health`].
//! Each handler lives in its own submodule.

pub mod health;
pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::RelayError;

pub async fn dispatch(cli: Cli) -> Result<(), RelayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  imgrelay v{version} \u{2014} same-origin image proxy\n\n  \
         No command provided. To get started:\n\n    \
         imgrelay run                      Start the proxy (auto-detects ./imgrelay.yaml)\n    \
         imgrelay init                     Generate a starter config\n    \
         imgrelay validate imgrelay.yaml   Check a config file\n    \
         imgrelay --help                   See all commands and options\n"
    );
}
