//! Web server implementation
//!
//! One page: `GET /` renders the home template with an empty context, and
//! `POST /` echoes the submitted item back into the rendered page. The
//! handlers do no post-processing of the rendered HTML.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::templates::{Templates, HOME_TEMPLATE, NEW_ITEM_KEY};

/// Shared per-process state.
struct AppState {
    templates: Templates,
}

/// Web server handle.
#[derive(Clone)]
pub struct WebServer {
    state: Arc<AppState>,
}

/// Convenience entry point used by `main`.
pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let server = WebServer::new()?;
    server.serve(addr).await
}

impl WebServer {
    /// Create a new web server.
    pub fn new() -> anyhow::Result<Self> {
        let templates = Templates::new()?;
        Ok(Self {
            state: Arc::new(AppState { templates }),
        })
    }

    /// Create the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(home_page).post(new_item))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server.
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Superlists starting on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "superlists-web"
    }))
}

async fn home_page(State(state): State<Arc<AppState>>) -> Response {
    render_home(&state, None)
}

#[derive(Debug, Deserialize)]
struct NewItemForm {
    #[serde(default)]
    item_text: Option<String>,
}

/// A missing `item_text` field means "no new item", not an error.
async fn new_item(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewItemForm>,
) -> Response {
    let context = form.item_text.map(|text| {
        let mut ctx = BTreeMap::new();
        ctx.insert(NEW_ITEM_KEY.to_string(), text);
        ctx
    });
    render_home(&state, context.as_ref())
}

fn render_home(state: &AppState, context: Option<&BTreeMap<String, String>>) -> Response {
    match state.templates.render(HOME_TEMPLATE, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("failed to render {}: {}", HOME_TEMPLATE, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}
