use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod state;
mod tasks_cmd;

#[derive(Parser, Debug)]
#[command(
    name = "balancehub",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BALANCEHUB_BUILD_SHA"), ")"),
    about = "BalanceHub: Eisenhower Matrix task manager"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Task commands (add, list, update, complete, ...)
    Task {
        #[command(subcommand)]
        command: tasks_cmd::TaskCommand,
    },

    /// Local configuration (~/.balancehub/config.toml)
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(&cfg.log.level);

    match cli.command {
        Command::Task { command } => tasks_cmd::run(command, &cfg)?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg)?,
        },
    }

    Ok(())
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
