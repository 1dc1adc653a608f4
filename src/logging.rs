use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the `-v` count.
/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init(verbose: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(verbose))?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "treesync=warn",
        1 => "treesync=info",
        2 => "treesync=debug",
        _ => "trace",
    }
}
