//! Logging initialization for the generator service.
//!
//! Sets up structured logging with the `tracing` ecosystem:
//!
//! - Filtering rules come from `RUST_LOG`, defaulting to `info`.
//! - Events are pretty-printed with thread ID, file and line number.
//! - Timestamps use local time in RFC 3339 format.
//!
//! Spans opened around each generation (`generation`, `stream`) carry the
//! request counts, so events emitted by worker and filter tasks can be tied
//! back to the request that spawned them.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;

    Ok(())
}
