//! portail - command-line client for the bulletin feed.
//!
//! Reads and writes a file-backed store and can follow a feed live, which
//! makes it handy for seeding data and watching what a UI would render.

mod cli;
mod commands;
mod output;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let root = store::resolve(cli.store)?;
    commands::handle(cli.command, root).await
}

/// The filter used when `RUST_LOG` is unset. Verbosity raises the
/// workspace crates first; dependencies only get chatty at `-vvv`.
fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,portail=info,portail_live=info,portail_file=info",
        2 => "info,portail=debug,portail_live=debug,portail_file=debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    // Logs go to stderr so command output stays pipeable.
    let layer = fmt::layer().with_writer(std::io::stderr);
    let layer = if json {
        layer.json().boxed()
    } else {
        layer.with_target(false).boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_widens_the_filter() {
        assert_eq!(default_directives(0), "warn");
        assert!(default_directives(1).contains("portail_live=info"));
        assert!(default_directives(2).contains("portail_file=debug"));
        assert_eq!(default_directives(7), "trace");

        for verbosity in 0..4 {
            assert!(default_directives(verbosity).parse::<EnvFilter>().is_ok());
        }
    }
}
