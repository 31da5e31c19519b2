mod app;
mod cli;
mod events;
mod logging;
mod persist;
mod strings;
mod terminal;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use terminal::TerminalGuard;
use tracing::info;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    let _log_guard = logging::init()?;
    info!(target: "tui", "starting {}", env!("CARGO_PKG_VERSION"));
    let mut app = app::App::new(args.into());
    let mut term = TerminalGuard::new()?;
    let res = events::run(&mut term.terminal, &mut app);
    info!(target: "tui", "exiting");
    res
}
