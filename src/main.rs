use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use levy_fractals::cli::{self, Cli};
use levy_fractals::FractalError;

fn run(args: &Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run(args, &mut out).with_context(|| format!("{} failed", args.command.name()))
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    let args = Cli::parse();

    // Set log level based on flags
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    // Logs go to stderr so reports on stdout stay machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting levy version {}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            if args.debug {
                tracing::debug!("Error details: {:?}", e);
            }
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<FractalError>()
                .map_or(1, FractalError::exit_code);
            ExitCode::from(code)
        }
    }
}
