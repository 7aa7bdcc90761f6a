//! HTTP server for the site.
//!
//! # Endpoints
//!
//! - `GET /`, `/thankyou`, `/why`, `/parkour`, `/weekly`, `/projects` - static pages
//! - `GET /honour` - honour wall from `honour.json`
//! - `GET /goodbyes` - goodbyes from `goodbyes.json`
//! - `GET /diaries` - Markdown diaries, newest first
//! - `GET /api/views` - increments and returns the view counter as JSON
//! - anything else - `302 Found` back to `/`
//!
//! Every endpoint records exactly one action through the [`ActionLog`]
//! held in [`AppState`].

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{Response, header};
use thiserror::Error;
use tower_http::compression::predicate::{And, Predicate, SizeAbove};
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tracing::{error, info};

pub mod client;
pub mod pages;
pub mod views;

pub use client::ClientInfo;
pub use pages::PageError;
pub use views::{ViewsResponse, views_handler};

use crate::bootstrap::{BootstrapError, ensure_layout};
use crate::config::{Config, GOODBYES_FILE, HONOUR_FILE, VIEWS_FILE};
use crate::logging::{ActionLog, LogRecord};
use crate::store::{JsonDocument, ViewCounter};

/// Responses smaller than this are sent uncompressed.
const MIN_COMPRESS_SIZE: u16 = 100;

/// Compression level for both brotli and gzip.
const COMPRESS_LEVEL: i32 = 9;

/// Content types worth compressing.
const COMPRESSIBLE_TYPES: [&str; 8] = [
    "text/html",
    "text/css",
    "text/xml",
    "application/json",
    "application/javascript",
    "application/xml",
    "text/plain",
    "text/markdown",
];

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    counter: ViewCounter,
    honour: JsonDocument,
    goodbyes: JsonDocument,
    diary_dir: PathBuf,
    action_log: Arc<dyn ActionLog>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory holding `views.json`, `honour.json` and `goodbyes.json`
    /// * `diary_dir` - Directory of Markdown diary entries
    /// * `action_log` - Where page views are recorded
    pub fn new(
        data_dir: impl AsRef<Path>,
        diary_dir: impl Into<PathBuf>,
        action_log: Arc<dyn ActionLog>,
    ) -> Self {
        let data_dir = data_dir.as_ref();
        AppState {
            inner: Arc::new(AppStateInner {
                counter: ViewCounter::new(data_dir.join(VIEWS_FILE)),
                honour: JsonDocument::new(data_dir.join(HONOUR_FILE)),
                goodbyes: JsonDocument::new(data_dir.join(GOODBYES_FILE)),
                diary_dir: diary_dir.into(),
                action_log,
            }),
        }
    }

    pub fn counter(&self) -> &ViewCounter {
        &self.inner.counter
    }

    pub fn honour(&self) -> &JsonDocument {
        &self.inner.honour
    }

    pub fn goodbyes(&self) -> &JsonDocument {
        &self.inner.goodbyes
    }

    pub fn diary_dir(&self) -> &Path {
        &self.inner.diary_dir
    }

    /// Records one action together with the client's IP signals.
    pub fn log_action(&self, action: &str, client: ClientInfo) {
        let record = LogRecord::new(action, client.cf_ip, client.xff, client.remote);
        self.inner.action_log.record(&record);
    }
}

/// Compresses responses whose content type is in [`COMPRESSIBLE_TYPES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressibleContentType;

impl Predicate for CompressibleContentType {
    fn should_compress<B>(&self, response: &Response<B>) -> bool
    where
        B: http_body::Body,
    {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_compressible)
    }
}

/// Checks the media type of a `Content-Type` value, ignoring parameters.
fn is_compressible(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    COMPRESSIBLE_TYPES
        .iter()
        .any(|t| essence.eq_ignore_ascii_case(t))
}

fn compression_layer() -> CompressionLayer<And<SizeAbove, CompressibleContentType>> {
    CompressionLayer::new()
        .quality(CompressionLevel::Precise(COMPRESS_LEVEL))
        .compress_when(SizeAbove::new(MIN_COMPRESS_SIZE).and(CompressibleContentType))
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/", get(pages::home))
        .route("/thankyou", get(pages::thank_you))
        .route("/why", get(pages::why))
        .route("/honour", get(pages::honour))
        .route("/diaries", get(pages::diaries))
        .route("/goodbyes", get(pages::goodbyes))
        .route("/api/views", get(views_handler))
        .route("/parkour", get(pages::parkour))
        .route("/weekly", get(pages::weekly))
        .route("/projects", get(pages::projects))
        .fallback(pages::not_found)
        .layer(compression_layer())
        .with_state(app_state)
}

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to prepare data directories: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("server IO error: {0}")]
    Io(#[from] io::Error),
}

/// Prepares the data layout and serves until Ctrl-C or SIGTERM.
pub async fn run(config: &Config, action_log: Arc<dyn ActionLog>) -> Result<(), ServeError> {
    ensure_layout(config)?;

    let app_state = AppState::new(&config.data_dir, config.diary_dir.clone(), action_log);
    let app = build_router(app_state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
