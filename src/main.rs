// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments, hand off to `ui`.
// - Returns `anyhow::Result` so any client error ends in a non-zero exit.

use clap::Parser;
use mockaroo::ui::{self, Cli};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    ui::run(cli)
}

/// `RUST_LOG` wins; otherwise `-v` flags raise the level from `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
