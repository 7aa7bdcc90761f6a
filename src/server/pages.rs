//! HTML page handlers and the catch-all redirect.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use maud::Markup;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use super::AppState;
use super::client::ClientInfo;
use crate::diary::{DiaryError, list_diaries};
use crate::render::{self, StaticPage};
use crate::store::JsonDocument;

/// Errors that turn into an error page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to load diaries: {0}")]
    Diaries(#[from] DiaryError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, render::server_error()).into_response()
    }
}

fn show(state: &AppState, client: ClientInfo, page: StaticPage) -> Markup {
    state.log_action(page.action(), client);
    page.render()
}

pub async fn home(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::Home)
}

pub async fn thank_you(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::ThankYou)
}

pub async fn why(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::Why)
}

pub async fn parkour(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::Parkour)
}

pub async fn weekly(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::Weekly)
}

pub async fn projects(State(state): State<AppState>, client: ClientInfo) -> Markup {
    show(&state, client, StaticPage::Projects)
}

pub async fn honour(State(state): State<AppState>, client: ClientInfo) -> Markup {
    let entries = load_entries(state.honour());
    state.log_action("Viewed Honour Wall", client);
    render::honour(&entries)
}

pub async fn goodbyes(State(state): State<AppState>, client: ClientInfo) -> Markup {
    let entries = load_entries(state.goodbyes());
    state.log_action("Viewed Goodbyes Page", client);
    render::goodbyes(&entries)
}

/// Lists diaries newest first. Any read failure yields a 500 page and no
/// action record.
pub async fn diaries(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<Markup, PageError> {
    let entries = list_diaries(state.diary_dir()).inspect_err(|e| {
        error!("Error loading diaries: {e}");
    })?;
    state.log_action("Viewed Diaries Page", client);
    Ok(render::diaries(&entries))
}

/// Sends every unknown path back to the home page.
pub async fn not_found(State(state): State<AppState>, client: ClientInfo) -> Response {
    state.log_action("404 Redirect", client);
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// Loads a list document, degrading to an empty list on any failure.
fn load_entries(document: &JsonDocument) -> Vec<Value> {
    document.load().unwrap_or_else(|e| {
        error!("Error loading {}: {e}", document.path().display());
        Vec::new()
    })
}
