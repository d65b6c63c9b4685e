mod app;
mod cli;
mod constants;
mod error;
mod history;
mod logging;
mod poller;
mod rate;
mod source;
mod ui;
mod util;

use std::{
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::Parser;

use crate::app::DashboardState;
use crate::cli::Args;
use crate::error::UiError;
use crate::poller::Poller;
use crate::source::HttpSource;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_file.as_deref(), &args.log_level)?;

    // SIGINT from outside the terminal; in raw mode Ctrl+C arrives as a key instead
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let url = args.api_url();
    let source = HttpSource::new(url.clone(), args.timeout())?;
    let poller = Poller::spawn(source)?;
    tracing::info!(url = %url, interval_ms = args.interval_ms, history = args.history, "starting monitor");

    let state = DashboardState::new(args.history);
    match ui::run(poller, state, &url, args.interval(), shutdown) {
        Ok(()) => {}
        Err(err @ UiError::Startup(_)) => {
            tracing::error!(error = %err, "display did not start");
            eprintln!("Error starting app: {err}");
            process::exit(1);
        }
        Err(err @ UiError::Session(_)) => {
            tracing::error!(error = %err, "display failed");
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }

    Ok(())
}
