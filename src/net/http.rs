use axum::{
    Json, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::animation::SkipPreference;
use crate::error::{AppError, AppResult, InfraError};
use crate::models::PageId;
use crate::net::output::init_session_for_websocket;
use crate::net::{AppCtx, PageTask};
use crate::renderer::html::{render_bsod, render_page};
use crate::renderer::{TERMINAL_CSS, TERMINAL_JS};
use crate::state::session::Protocol;
use crate::{Registry, Session};

pub const SKIP_COOKIE: &str = "skipTyping";

#[derive(Clone)]
struct HttpAppCtx {
    registry: Arc<Registry>,
}

/// Run the HTTP server: pages, assets and the animation websocket
pub async fn serve(addr: std::net::SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    axum::serve(listener, app).await.map_err(InfraError::from)?;
    Ok(())
}

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/", get(page_html))
        .route("/projects", get(page_html))
        .route("/about", get(page_html))
        .route("/contact", get(page_html))
        .route("/bsod", get(bsod_html))
        .route("/skip", post(toggle_skip))
        .route("/api/pages/{page}", get(page_json))
        .route("/ws/{page}", get(ws_upgrade))
        .route("/assets/terminal.css", get(terminal_css))
        .route("/assets/terminal.js", get(terminal_js))
        .fallback(not_found)
        .with_state(HttpAppCtx { registry })
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UnknownPage(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } | AppError::InvalidContent(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// The stored skip preference, `None` when the browser has no cookie yet.
pub fn skip_from_headers(headers: &HeaderMap) -> Option<SkipPreference> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SKIP_COOKIE)
        .map(|(_, value)| SkipPreference::from_stored(Some(value.trim())))
}

fn skip_cookie(pref: SkipPreference) -> String {
    format!(
        "{SKIP_COOKIE}={}; Path=/; Max-Age=31536000; SameSite=Lax",
        pref.as_stored()
    )
}

/// Page the `Referer` points at, so the form post lands back where it came from.
fn referer_page(headers: &HeaderMap) -> PageId {
    let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) else {
        return PageId::Home;
    };
    let path = match referer.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => referer,
    };
    let path = path.split(['?', '#']).next().unwrap_or("/");
    PageId::from_path(path).unwrap_or(PageId::Home)
}

async fn page_html(State(state): State<HttpAppCtx>, uri: Uri, headers: HeaderMap) -> Response {
    let site = &state.registry.site;
    let page = PageId::from_path(uri.path()).and_then(|id| site.page(id));
    let Some(page) = page else {
        return not_found().await.into_response();
    };

    let skip = skip_from_headers(&headers).unwrap_or(state.registry.default_skip);
    Html(render_page(site, page, skip)).into_response()
}

async fn bsod_html() -> Html<String> {
    Html(render_bsod())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(render_bsod()))
}

/// The no-script fallback of the minimize button.
async fn toggle_skip(State(state): State<HttpAppCtx>, headers: HeaderMap) -> impl IntoResponse {
    let current = skip_from_headers(&headers).unwrap_or(state.registry.default_skip);
    let next = current.toggled();
    let back = referer_page(&headers);
    tracing::debug!(page = %back, skip = next.is_on(), "skip toggled by form post");

    ([(header::SET_COOKIE, skip_cookie(next))], Redirect::to(back.path()))
}

async fn page_json(State(state): State<HttpAppCtx>, Path(page): Path<String>) -> AppResult<Response> {
    let id: PageId = page.parse()?;
    let page = state
        .registry
        .site
        .page(id)
        .ok_or_else(|| AppError::UnknownPage(id.to_string()))?;

    let blocks: Vec<_> = page
        .blocks
        .iter()
        .map(|b| {
            json!({
                "order": b.order,
                "style": b.style,
                "target_text": b.target_text(),
                "segments": b.segments,
            })
        })
        .collect();

    Ok(Json(json!({
        "id": page.id,
        "path": page.id.path(),
        "tab": page.id.tab(),
        "cwd": page.cwd,
        "cycle_anchor": page.cycle_anchor(),
        "blocks": blocks,
    }))
    .into_response())
}

async fn terminal_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], TERMINAL_CSS)
}

async fn terminal_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], TERMINAL_JS)
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(page): Path<String>,
    State(state): State<HttpAppCtx>,
    headers: HeaderMap,
) -> Response {
    let id = match page.parse::<PageId>() {
        Ok(id) if id != PageId::Bsod => id,
        _ => return AppError::UnknownPage(page).into_response(),
    };
    let skip = skip_from_headers(&headers).unwrap_or(state.registry.default_skip);

    ws.on_upgrade(move |socket| ws_handler(socket, state.registry.clone(), id, skip))
}

async fn ws_handler(socket: WebSocket, registry: Arc<Registry>, page: PageId, skip: SkipPreference) {
    let (ws_write, mut ws_read) = socket.split();

    let sess = Arc::new(RwLock::new(Session::new(Protocol::WebSocket, page, skip)));
    let session_id = sess.read().id;
    registry.set_online(session_id, Protocol::WebSocket, true);

    let ctx = AppCtx {
        output: init_session_for_websocket(ws_write),
        registry: registry.clone(),
        sess: sess.clone(),
    };

    let mut task = PageTask::default();
    if let Err(e) = task.open(&ctx, false).await {
        tracing::warn!(page = %page, error = %e, "cannot open page view");
    }

    while let Some(Ok(msg)) = ws_read.next().await {
        let text = match msg {
            Message::Text(t) => t.as_str().to_owned(),
            Message::Binary(b) => String::from_utf8_lossy(&b).to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        match text.trim() {
            "skip" => {
                if let Err(e) = task.toggle_skip(&ctx).await {
                    tracing::warn!(page = %page, error = %e, "skip toggle failed");
                }
            }
            "" => {}
            other => tracing::debug!(msg = other, "ignoring client message"),
        }
    }

    task.stop();
    registry.set_online(session_id, Protocol::WebSocket, false);
}
