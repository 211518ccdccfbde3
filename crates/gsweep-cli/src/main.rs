mod cli;
mod commands;
mod login;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::Output;

/// Raw upstream detail is logged under this target; it is silenced unless
/// development mode is on.
const DEV_TARGET_OFF: &str = "gsweep::dev=off";

fn log_filter(verbose: bool, dev_mode: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if dev_mode {
        return filter;
    }
    match DEV_TARGET_OFF.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn init_tracing(verbose: bool, dev_mode: bool) {
    let filter = log_filter(verbose, dev_mode);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dev_mode = gsweep::Config::load().is_ok_and(|config| config.dev_mode);
    init_tracing(cli.verbose, dev_mode);

    let out = Output { json: cli.json };
    match cli.command {
        Command::Files(cmd) => commands::files(cmd, cli.token, &out).await,
        Command::Mail(cmd) => commands::mail(cmd, cli.token, &out).await,
        Command::Auth(cmd) => commands::auth(cmd, &out).await,
        Command::Check(cmd) => commands::check(cmd, &out),
    }
}
