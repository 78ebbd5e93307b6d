//! Ambient logging (SPEC_FULL.md §10.1). The teacher's `libs/runtime/src/logging.rs`
//! routes logs from many independently-versioned plugin modules to separate
//! rotating files; this kernel is a single crate with a single log stream, so
//! it keeps only the one piece of that machinery that still earns its keep:
//! bridging the `log` facade into `tracing` and an `EnvFilter`-driven stdout
//! layer whose default level follows `-v`/`-vv`/`-vvv`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init(verbosity: u8) {
    let _ = tracing_log::LogTracer::init();

    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
