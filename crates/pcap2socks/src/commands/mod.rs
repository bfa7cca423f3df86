//! Command dispatch: bridges CLI args -> core session -> output formatting.

pub mod config_cmd;
pub mod engine;
pub mod interfaces;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Interfaces => interfaces::handle(global).await,
        Command::Run(args) => engine::run(args, global).await,
        Command::Stop => engine::stop(global).await,
        Command::Test(args) => engine::test(args, global).await,
        Command::Status => engine::status(global).await,
        Command::Config(args) => config_cmd::handle(args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
