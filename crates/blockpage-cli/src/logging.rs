//! Logging initialization.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Install the global tracing subscriber for the CLI flags.
///
/// Logs go to stderr. Only warnings and errors show by default; `-v` or
/// `--debug` bring back the info and debug output.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Level for the given flags. Machine-readable output drops to errors only
/// unless verbose or debug logging was requested explicitly.
fn log_level(cli: &Cli) -> Level {
    if cli.verbose || cli.debug {
        Level::DEBUG
    } else if cli.quiet || cli.machine_output() {
        Level::ERROR
    } else {
        Level::WARN
    }
}
