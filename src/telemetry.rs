use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "info,ticker_terminal_lib=debug";

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init_tracing(DEFAULT_LOG_FILTER);
        assert!(!init_tracing(DEFAULT_LOG_FILTER));
    }
}
