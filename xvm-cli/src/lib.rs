//! XVM command-line support: program files, terminal I/O, the debugger
//! shell, and the subcommand implementations behind the `xvm` binary.

pub mod commands;
pub mod io;
pub mod shell;
pub mod source;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr log subscriber. `RUST_LOG` overrides the default
/// `warn` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
