use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Initialize a formatted stderr subscriber with the given filter.
///
/// `filter` follows the `RUST_LOG` directive syntax (e.g. `cobralib=debug`).
/// Calling this twice returns an error from the subscriber registry; tests
/// that share a process should ignore it.
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| Error::Config(format!("invalid log filter: {err}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::Config(format!("logging already initialized: {err}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        let result = init_logging("not==a==filter");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
