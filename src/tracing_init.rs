//! Tracing setup for binaries and tests
//!
//! One place configures the `tracing` subscriber so every pipeline stage logs the
//! same way. Output is filtered through `RUST_LOG`, for example:
//! - `RUST_LOG=rfsweep=debug` - everything the pipeline logs
//! - `RUST_LOG=rfsweep::stitch=trace` - a single module
//! - `RUST_LOG=rfsweep=info,rfsweep::welch=debug` - mixed levels

#[cfg(test)]
use once_cell::sync::Lazy;

/// Initialize tracing for unit tests with environment-based filtering
///
/// Falls back to `rfsweep=warn` when `RUST_LOG` is unset, so degraded-result
/// warnings (short buffers, skipped segments, clamped bins) show up next to a
/// failing assertion. Output goes through the test writer and is captured by
/// the harness.
///
/// Call this at the start of each test that needs tracing. Repeated calls are
/// safe; the subscriber is installed once per test binary.
#[cfg(test)]
pub fn init_test_tracing() {
    static TRACING: Lazy<()> = Lazy::new(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("rfsweep=warn"));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .with_test_writer()
            .init();
    });

    Lazy::force(&TRACING);
}

/// Initialize tracing for binaries with environment-based filtering
///
/// Call this early in `main()`. Falls back to `rfsweep=info`. Logs go to stderr
/// so that CSV written to stdout stays clean.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rfsweep=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
