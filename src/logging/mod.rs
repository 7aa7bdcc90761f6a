//! Request logging for the site.
//!
//! Two pieces work together:
//! - [`ActionLog`] is the explicit logging context handed to the HTTP
//!   surface. Handlers describe what happened as a [`LogRecord`].
//! - [`SiteLogLayer`] is the process-wide `tracing` layer that turns every
//!   event (action records and error reports alike) into a text line for the
//!   rotating file and the colored console.

pub mod action;
pub mod layer;
pub mod rotate;

pub use action::{ActionLog, LogRecord, TracingActionLog, resolve_real_ip};
pub use layer::SiteLogLayer;
pub use rotate::RotatingFile;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "thankyou_site=info,info";

/// Installs the global subscriber. Call once per process.
pub fn init(config: &Config) {
    let file = RotatingFile::new(&config.log_file, config.log_max_bytes, config.log_backups);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(SiteLogLayer::new(Some(file)).with_console(!config.no_console_log))
        .init();
}
