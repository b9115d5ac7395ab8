use clap::{Parser, Subcommand};

use self::{check_config::CheckConfigArg, simulate::SimulateArg};

mod check_config;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log engine events at debug level (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Load a configuration and print a summary of it
    CheckConfig(#[clap(flatten)] CheckConfigArg),
    /// Run a headless game with random inputs
    Simulate(#[clap(flatten)] SimulateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.mode {
        Mode::CheckConfig(arg) => check_config::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
