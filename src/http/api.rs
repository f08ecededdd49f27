//! Navigation API: `/api/history` and `/api/bookmarks`.
//!
//! Every response uses the `{ success, data?, error? }` envelope, including
//! malformed JSON bodies, which are reported as 400 instead of axum's plain
//! text rejection. Store calls may write the snapshot file, so they run on the
//! blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiResponse, GatewayError, Result};
use crate::http::server::AppState;
use crate::storage::{
    Bookmark, HistoryItem, MemoryStore, NavigationStore, NewBookmark, NewHistoryItem, StorageError,
};

type ListResponse<T> = Json<ApiResponse<Vec<T>>>;

pub async fn get_history(State(state): State<AppState>) -> Result<ListResponse<HistoryItem>> {
    let history = with_store(&state, |nav| nav.get_history()).await?;
    Ok(Json(ApiResponse::ok(history)))
}

pub async fn add_history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewHistoryItem>, JsonRejection>,
) -> Result<ListResponse<HistoryItem>> {
    let Json(entry) = payload.map_err(rejected)?;
    require_url(&entry.url)?;
    let history = with_store(&state, move |nav| nav.add_history_item(entry)).await?;
    Ok(Json(ApiResponse::ok(history)))
}

pub async fn clear_history(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>> {
    with_store(&state, |nav| nav.clear_history()).await?;
    Ok(Json(ApiResponse::empty()))
}

pub async fn get_bookmarks(State(state): State<AppState>) -> Result<ListResponse<Bookmark>> {
    let bookmarks = with_store(&state, |nav| nav.get_bookmarks()).await?;
    Ok(Json(ApiResponse::ok(bookmarks)))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewBookmark>, JsonRejection>,
) -> Result<ListResponse<Bookmark>> {
    let Json(entry) = payload.map_err(rejected)?;
    require_url(&entry.url)?;
    let bookmarks = with_store(&state, move |nav| nav.toggle_bookmark(entry)).await?;
    Ok(Json(ApiResponse::ok(bookmarks)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveBookmarkQuery {
    url: Option<String>,
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    Query(query): Query<RemoveBookmarkQuery>,
) -> Result<ListResponse<Bookmark>> {
    let url = query.url.unwrap_or_default();
    require_url(&url)?;
    let bookmarks = with_store(&state, move |nav| nav.remove_bookmark(&url)).await?;
    Ok(Json(ApiResponse::ok(bookmarks)))
}

async fn with_store<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&NavigationStore<MemoryStore>) -> std::result::Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let navigation = state.navigation.clone();
    tokio::task::spawn_blocking(move || op(&navigation))
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
        .map_err(GatewayError::from)
}

fn rejected(rejection: JsonRejection) -> GatewayError {
    GatewayError::BadRequest(rejection.body_text())
}

fn require_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(GatewayError::BadRequest("url is required".to_string()));
    }
    Ok(())
}
