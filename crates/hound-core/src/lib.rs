// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// `directives` (normally `RUST_LOG`) as a filter, or [`DEFAULT_FILTER`].
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the process-wide subscriber. Filtering follows `RUST_LOG`;
/// without it everything at `info` and above is printed.
pub fn init_tracing() {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = fmt()
        .with_env_filter(log_filter(env.as_deref()))
        .with_target(false)
        .compact()
        .try_init();
    tracing::debug!("tracing initialised");
}
