//! Shared helpers for linkwatch's integration tests.

pub mod builders;
pub mod fake_rebuild;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Install a test-scoped subscriber once per test binary.
///
/// Output goes through the harness's capture, so it only shows up for
/// failing tests or with `-- --nocapture`. `RUST_LOG` overrides the
/// default of debug for this crate and warn for everything else, e.g.
/// `RUST_LOG=linkwatch::watch=trace cargo test dispatch`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,linkwatch=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}
