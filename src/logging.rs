use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber. `RUST_LOG` wins when set; otherwise only
/// warnings are shown, or debug output with `verbose`. Records emitted through
/// the `log` facade are bridged in.
pub fn init_logging(verbose: bool) {
    let directive = if verbose {
        "stackdown=debug"
    } else {
        "stackdown=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        log::debug!("Logging already initialized: {}", e);
    }
}
