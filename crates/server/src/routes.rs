use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use boxbridge_core::error::ApiError;
use boxbridge_core::{
    BoxType, FileNode, MediaDetail, MediaKind, QualityVariant, SearchResult, ShareKey,
};
use boxbridge_metadata::DEFAULT_PAGE_LIMIT;
use boxbridge_resolver::{NodeSelector, Resolution, ResolveRequest, TreeWalk};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Deepest folder chain a caller may ask `/api/resolve` to follow.
const MAX_WALK_DEPTH: usize = 8;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .nest("/api", api_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Metadata service
        .route("/search/{kind}", get(search))
        .route("/movie/{id}", get(movie_details))
        .route("/show/{id}", get(show_details))
        // File service
        .route("/febbox/id", get(share_key))
        .route("/febbox/files/{share_key}", get(list_files))
        .route("/febbox/links/{share_key}/{fid}", get(quality_links))
        // Both
        .route("/resolve/{kind}", get(resolve))
}

fn parse_kind(kind: &str) -> Result<MediaKind, AppError> {
    kind.parse::<MediaKind>()
        .map_err(|e| AppError(ApiError::BadRequest(e.to_string())))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError(ApiError::BadRequest(format!("missing query parameter: {name}"))))
}

async fn not_found(uri: Uri) -> AppError {
    AppError(ApiError::NotFound(format!("no route for {}", uri.path())))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn banner() -> &'static str {
    "boxbridge: showbox metadata and febbox stream resolution"
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchQuery {
    title: Option<String>,
    page: Option<u32>,
    pagelimit: Option<u32>,
}

async fn search(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    let kind = parse_kind(&kind)?;
    let title = required(q.title, "title")?;
    let page = q.page.unwrap_or(1).max(1);
    let page_limit = q.pagelimit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);

    let results = state.metadata.search(&title, kind, page, page_limit).await?;
    Ok(Json(results))
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaDetail>, AppError> {
    Ok(Json(state.metadata.get_movie_details(&id).await?))
}

async fn show_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaDetail>, AppError> {
    Ok(Json(state.metadata.get_show_details(&id).await?))
}

// ---------------------------------------------------------------------------
// File service
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ShareKeyQuery {
    id: Option<String>,
    #[serde(rename = "type")]
    box_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareKeyResponse {
    feb_box_id: Option<ShareKey>,
}

async fn share_key(
    State(state): State<AppState>,
    Query(q): Query<ShareKeyQuery>,
) -> Result<Json<ShareKeyResponse>, AppError> {
    let id = required(q.id, "id")?;
    let box_type = match q.box_type.as_deref().map(str::trim) {
        None | Some("") | Some("movie") => BoxType::MOVIE,
        Some("tv") | Some("show") => BoxType::TV,
        Some(raw) => BoxType(raw.parse().map_err(|_| {
            AppError(ApiError::BadRequest(format!("invalid type: {raw}")))
        })?),
    };

    let key = state.metadata.get_share_key(&id, box_type).await?;
    Ok(Json(ShareKeyResponse { feb_box_id: key }))
}

#[derive(Deserialize)]
struct FilesQuery {
    parent_id: Option<String>,
}

async fn list_files(
    State(state): State<AppState>,
    Path(share_key): Path<String>,
    Query(q): Query<FilesQuery>,
) -> Result<Json<Vec<FileNode>>, AppError> {
    let parent = q.parent_id.unwrap_or_else(|| FileNode::ROOT.to_string());
    let files = state
        .files
        .list_files(&ShareKey::new(share_key), &parent)
        .await?;
    Ok(Json(files))
}

async fn quality_links(
    State(state): State<AppState>,
    Path((share_key, fid)): Path<(String, String)>,
) -> Result<Json<Vec<QualityVariant>>, AppError> {
    let variants = state
        .files
        .quality_variants(&ShareKey::new(share_key), &fid)
        .await?;
    Ok(Json(variants))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ResolveQuery {
    title: Option<String>,
    /// Which search result to follow.
    pick: Option<usize>,
    /// Which entry to take inside the share (or season folder).
    index: Option<usize>,
    season: Option<u32>,
    episode: Option<u32>,
    depth: Option<usize>,
}

impl ResolveQuery {
    fn tree_walk(&self) -> TreeWalk {
        let walk = match (self.season, self.episode) {
            (Some(season), Some(episode)) => {
                TreeWalk::new(NodeSelector::Episode { season, episode })
            }
            (Some(season), None) => TreeWalk::new(NodeSelector::Season { season }).then(
                NodeSelector::Index {
                    index: self.index.unwrap_or(0),
                },
            ),
            _ => match self.index {
                Some(index) => TreeWalk::new(NodeSelector::Index { index }),
                None => TreeWalk::default(),
            },
        };
        match self.depth {
            Some(depth) => walk.with_max_depth(depth.min(MAX_WALK_DEPTH)),
            None => walk,
        }
    }
}

async fn resolve(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(q): Query<ResolveQuery>,
) -> Result<Json<Resolution>, AppError> {
    let kind = parse_kind(&kind)?;
    let walk = q.tree_walk();
    let title = required(q.title, "title")?;

    let req = ResolveRequest::new(title, kind)
        .pick(q.pick.unwrap_or(0))
        .walk(walk);
    Ok(Json(state.pipeline.resolve(&req).await?))
}
