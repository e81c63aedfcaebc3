//! Main HTTP server.
//!
//! REST routes for the deck and the presenter, plus the WS and SSE streams.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use stardeck_logging::redact_sensitive_data;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, info_span, instrument};

use crate::auth::RequirePresenter;
use crate::presentation::Presentation;
use crate::sse::events_handler;
use crate::ws_server::ws_handler;

/// Build the router. `assets` is served as a fallback so slides can
/// reference images relative to the deck file.
pub fn build_router(presentation: Presentation, assets: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/deck", get(deck_summary))
        .route("/api/slides/:index", get(slide))
        .route("/api/state", get(state))
        .route("/api/ws", get(ws_handler))
        .route("/api/events", get(events_handler))
        .route("/api/presenter/next", post(presenter_next))
        .route("/api/presenter/prev", post(presenter_prev))
        .route("/api/presenter/goto", post(presenter_goto))
        .route("/api/presenter/step", post(presenter_step))
        .route("/api/presenter/annotations", post(presenter_annotations))
        .route("/api/presenter/pointer", post(presenter_pointer))
        .with_state(presentation);

    if let Some(dir) = assets {
        app = app.fallback_service(ServeDir::new(dir));
    }

    // Request spans carry the URI; presenter tokens in the query are scrubbed.
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        info_span!(
            "http_request",
            method = %req.method(),
            uri = %redact_sensitive_data(&req.uri().to_string()),
        )
    });
    app.layer(CorsLayer::permissive()).layer(trace)
}

/// Serve `app` until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("StarDeck server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "stardeck",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Deck summary for clients and tooling.
async fn deck_summary(State(presentation): State<Presentation>) -> Json<Value> {
    let deck = presentation.deck().await;
    let slides: Vec<Value> = deck
        .slides()
        .iter()
        .map(|s| {
            json!({
                "index": s.index,
                "title": s.title,
                "layout": s.layout(),
                "max_step": s.max_step,
                "diagnostics": s.diagnostics.len(),
            })
        })
        .collect();
    Json(json!({
        "title": deck.config.title,
        "theme": deck.config.theme,
        "transition": deck.config.transition,
        "aspect_ratio": deck.config.aspect_ratio,
        "total": deck.len(),
        "slides": slides,
        "diagnostics": deck.diagnostics().collect::<Vec<_>>(),
    }))
}

/// Rendered slide fragment; out-of-range indices clamp.
async fn slide(State(presentation): State<Presentation>, Path(index): Path<usize>) -> Html<String> {
    let (_, html) = presentation.slide_html(index).await;
    Html(html)
}

async fn state(State(presentation): State<Presentation>) -> Json<Value> {
    Json(json!({ "position": presentation.state_view().await }))
}

async fn navigation_reply(presentation: &Presentation, changed: bool) -> Json<Value> {
    Json(json!({
        "changed": changed,
        "position": presentation.state_view().await,
    }))
}

async fn presenter_next(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
) -> Json<Value> {
    let changed = presentation.advance(&grant).await;
    navigation_reply(&presentation, changed).await
}

async fn presenter_prev(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
) -> Json<Value> {
    let changed = presentation.retreat(&grant).await;
    navigation_reply(&presentation, changed).await
}

#[derive(Debug, Default, Deserialize)]
pub struct GotoRequest {
    pub index: Option<usize>,
    pub step: Option<usize>,
    /// `N[.S]` deep link; takes precedence over `index`.
    pub link: Option<String>,
}

async fn presenter_goto(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
    Json(req): Json<GotoRequest>,
) -> Json<Value> {
    let changed = match req.link {
        Some(link) => presentation.goto_link(&grant, &link).await,
        None => presentation.goto_slide(&grant, req.index.unwrap_or(0), req.step).await,
    };
    navigation_reply(&presentation, changed).await
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub step: usize,
}

async fn presenter_step(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
    Json(req): Json<StepRequest>,
) -> Json<Value> {
    let changed = presentation.goto_step(&grant, req.step).await;
    navigation_reply(&presentation, changed).await
}

#[derive(Debug, Deserialize)]
pub struct AnnotationRequest {
    /// Defaults to the current slide.
    pub slide: Option<usize>,
    pub changes: Vec<Value>,
}

async fn presenter_annotations(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
    Json(req): Json<AnnotationRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let slide = match req.slide {
        Some(slide) => slide,
        None => presentation.position().await.slide,
    };
    match presentation.submit_annotations(&grant, slide, req.changes).await {
        Ok(report) => Ok(Json(json!({ "applied": report.applied, "skipped": report.skipped }))),
        Err(e) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.code(), "message": e.to_string() })),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct PointerRequest {
    pub x: f64,
    pub y: f64,
}

async fn presenter_pointer(
    State(presentation): State<Presentation>,
    RequirePresenter(grant): RequirePresenter,
    Json(req): Json<PointerRequest>,
) -> Json<Value> {
    presentation.pointer(&grant, req.x, req.y).await;
    Json(json!({ "status": "ok" }))
}
