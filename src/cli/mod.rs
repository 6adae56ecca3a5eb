//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Scaffold a story directory |
//! | `check` | Run the publishing pipeline and report |
//! | `publish` | Run the pipeline and write `published.json` |
//! | `graph` | Show the link graph, with ghost nodes for missing targets |
//! | `lines` | Classify the lines of a scene file |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Diagnostics go through `tracing` to stderr. `RUST_LOG` sets the filter
//! (default `storyline_cli=warn`); `--verbose` turns on debug level for
//! this crate regardless.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod check;
mod graph;
mod lines;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

/// Installs the stderr log subscriber
///
/// `RUST_LOG` replaces the default `storyline_cli=warn`; `--verbose` always
/// adds debug output for this crate on top.
fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storyline_cli=warn"));

    if verbose {
        if let Ok(directive) = "storyline_cli=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Already installed is fine
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
