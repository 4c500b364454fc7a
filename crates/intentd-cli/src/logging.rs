use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "intentd=info,intentd_ai=info,intentd_http=info,tower_http=info";
const VERBOSE_LOG_FILTER: &str = "intentd=debug,intentd_ai=debug,intentd_http=debug,tower_http=debug";

/// Initialize stderr logging. `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
