// HTTP routes invoked by the chat-platform dispatcher.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::db::{Database, SizeTier};
use crate::flow::{BeginOutcome, CommitOutcome, FlowError, SelectionFlow};
use crate::language::Language;
use crate::metrics;
use crate::render;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TrackRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct SizeSelectionRequest {
    pub user_id: String,
    pub size: String,
}

#[derive(Deserialize)]
pub struct MonsterSelectionRequest {
    pub user_id: String,
    pub monster: String,
}

#[derive(Deserialize)]
pub struct SetLanguageRequest {
    pub user_id: String,
    pub language: String,
}

#[derive(Deserialize)]
pub struct UserParams {
    pub user_id: String,
}

// ── Reply types ───────────────────────────────────────────────────────

/// One entry in a constrained select menu rendered by the chat client.
#[derive(Debug, Clone, Serialize)]
pub struct MenuOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A formatted reply for the chat client: message text plus an optional
/// option menu for the next step of a flow.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<MenuOption>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl Reply {
    fn text(content: impl Into<String>) -> Self {
        Reply {
            content: content.into(),
            options: None,
            truncated: false,
        }
    }

    fn menu(content: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Reply {
            content: content.into(),
            options: Some(options),
            truncated: false,
        }
    }
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub catalog: CatalogClient,
    pub flow: SelectionFlow,
    pub menu_option_cap: usize,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: sqlx::Error) -> impl IntoResponse {
    tracing::error!("Database error: {e}");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "There was an error processing your request.",
    )
}

const CATALOG_UNAVAILABLE: &str = "Could not fetch monster list. Please try again later.";

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/commands/track", post(track_start))
        .route("/api/commands/track/size", post(track_size))
        .route("/api/commands/track/monster", post(track_monster))
        .route("/api/commands/progress", get(progress))
        .route("/api/commands/missing", get(missing))
        .route(
            "/api/commands/language",
            get(language_menu).post(set_language),
        )
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}

async fn metrics_endpoint() -> String {
    metrics::gather_metrics()
}

// ── Tracking flow handlers ────────────────────────────────────────────

/// Entry point of the flow: offer the two size tiers.
async fn track_start(Json(req): Json<TrackRequest>) -> impl IntoResponse {
    tracing::info!(user_id = %req.user_id, "track command invoked");
    metrics::COMMANDS_TOTAL
        .with_label_values(&["track", "ok"])
        .inc();

    let options = SizeTier::ALL
        .iter()
        .map(|size| MenuOption {
            label: size.label().to_string(),
            value: size.as_str().to_string(),
            description: Some(format!("Record as {} seen", size.as_str())),
        })
        .collect();
    (StatusCode::OK, Json(Reply::menu("Select a size:", options)))
}

/// Size chosen: remember it and offer the monsters still untracked at
/// that size.
async fn track_size(
    State(state): State<AppState>,
    Json(req): Json<SizeSelectionRequest>,
) -> impl IntoResponse {
    let size = match SizeTier::parse(&req.size) {
        Some(size) => size,
        None => {
            return json_error(StatusCode::BAD_REQUEST, "Unknown size. Choose from the menu.")
                .into_response()
        }
    };

    match state.flow.begin(&req.user_id, size).await {
        Ok(BeginOutcome::Menu { options, truncated }) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_size", "ok"])
                .inc();
            let menu: Vec<MenuOption> = options
                .iter()
                .map(|name| MenuOption {
                    label: name.clone(),
                    value: name.to_lowercase(),
                    description: None,
                })
                .collect();
            let mut content = format!("Selected size: **{size}**. Now choose a monster!");
            if truncated {
                content.push('\n');
                content.push_str(&render::truncation_notice(state.menu_option_cap));
            }
            let reply = Reply {
                content,
                options: Some(menu),
                truncated,
            };
            (StatusCode::OK, Json(reply)).into_response()
        }
        Ok(BeginOutcome::AllTracked) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_size", "ok"])
                .inc();
            (
                StatusCode::OK,
                Json(Reply::text(format!(
                    "🎉 You have already tracked every monster at **{size}**!"
                ))),
            )
                .into_response()
        }
        Err(FlowError::Catalog(_)) | Err(FlowError::EmptyCatalog) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_size", "catalog_error"])
                .inc();
            json_error(StatusCode::BAD_GATEWAY, CATALOG_UNAVAILABLE).into_response()
        }
        Err(FlowError::Storage(e)) => internal_error(e).into_response(),
        Err(FlowError::NoSizeSelected) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "unexpected flow state").into_response()
        }
    }
}

/// Monster chosen: commit the encounter against the pending size.
async fn track_monster(
    State(state): State<AppState>,
    Json(req): Json<MonsterSelectionRequest>,
) -> impl IntoResponse {
    match state.flow.commit(&req.user_id, &req.monster).await {
        Ok(CommitOutcome::Recorded { monster, size }) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_monster", "ok"])
                .inc();
            (
                StatusCode::OK,
                Json(Reply::text(format!(
                    "Logged **{size}** **{monster}** encounter!"
                ))),
            )
                .into_response()
        }
        Ok(CommitOutcome::AlreadyTracked { monster, size }) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_monster", "duplicate"])
                .inc();
            (
                StatusCode::OK,
                Json(Reply::text(format!(
                    "You have already logged a **{size}** **{monster}** encounter."
                ))),
            )
                .into_response()
        }
        Err(FlowError::NoSizeSelected) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["track_monster", "flow_error"])
                .inc();
            json_error(
                StatusCode::CONFLICT,
                "Please select a size first! Use /track to restart.",
            )
            .into_response()
        }
        Err(FlowError::Storage(e)) => internal_error(e).into_response(),
        Err(FlowError::Catalog(_)) | Err(FlowError::EmptyCatalog) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "unexpected flow state").into_response()
        }
    }
}

// ── Query command handlers ────────────────────────────────────────────

async fn progress(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    tracing::info!(user_id = %params.user_id, "progress command invoked");
    match state.db.list_encounters(&params.user_id).await {
        Ok(encounters) if encounters.is_empty() => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["progress", "ok"])
                .inc();
            (
                StatusCode::OK,
                Json(Reply::text(
                    "You haven't logged any monster encounters yet. Use /track to start tracking!",
                )),
            )
                .into_response()
        }
        Ok(encounters) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["progress", "ok"])
                .inc();
            (StatusCode::OK, Json(Reply::text(render::format_progress(&encounters))))
                .into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

async fn missing(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    tracing::info!(user_id = %params.user_id, "missing command invoked");

    let language = match state.db.get_language(&params.user_id).await {
        Ok(lang) => lang,
        Err(e) => return internal_error(e).into_response(),
    };

    // A failed or empty catalog must never read as "100% missing".
    let catalog = match state.catalog.fetch_catalog(language).await {
        Ok(catalog) if !catalog.is_empty() => catalog,
        Ok(_) | Err(_) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["missing", "catalog_error"])
                .inc();
            return json_error(StatusCode::BAD_GATEWAY, CATALOG_UNAVAILABLE).into_response();
        }
    };

    let encounters = match state.db.list_encounters(&params.user_id).await {
        Ok(encounters) => encounters,
        Err(e) => return internal_error(e).into_response(),
    };

    metrics::COMMANDS_TOTAL
        .with_label_values(&["missing", "ok"])
        .inc();
    let reports = render::missing_by_size(&catalog, &encounters);
    (StatusCode::OK, Json(Reply::text(render::format_missing(&reports)))).into_response()
}

// ── Language handlers ─────────────────────────────────────────────────

async fn language_menu(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    let current = match state.db.get_language(&params.user_id).await {
        Ok(lang) => lang,
        Err(e) => return internal_error(e).into_response(),
    };

    let options = Language::ALL
        .iter()
        .map(|lang| MenuOption {
            label: lang.display_name().to_string(),
            value: lang.code().to_string(),
            description: Some(format!("Display monster names in {}", lang.display_name())),
        })
        .collect();

    metrics::COMMANDS_TOTAL
        .with_label_values(&["language", "ok"])
        .inc();
    (
        StatusCode::OK,
        Json(Reply::menu(
            format!(
                "Select your preferred language for monster names.\nCurrent setting: **{}**",
                current.display_name()
            ),
            options,
        )),
    )
        .into_response()
}

async fn set_language(
    State(state): State<AppState>,
    Json(req): Json<SetLanguageRequest>,
) -> impl IntoResponse {
    let language = match Language::parse(&req.language) {
        Some(lang) => lang,
        None => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "Unknown language. Choose from the menu.",
            )
            .into_response()
        }
    };

    match state.db.set_language(&req.user_id, language).await {
        Ok(()) => {
            metrics::COMMANDS_TOTAL
                .with_label_values(&["language", "ok"])
                .inc();
            tracing::info!(user_id = %req.user_id, language = %language, "language preference updated");
            (
                StatusCode::OK,
                Json(Reply::text(format!(
                    "✅ Your language preference has been set to **{}**. \
                     Monster names will now be displayed in your chosen language.",
                    language.display_name()
                ))),
            )
                .into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}
