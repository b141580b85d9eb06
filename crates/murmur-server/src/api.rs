use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{Method, StatusCode},
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use murmur_shared::{ConversationSummary, UserId, ValidationError};
use murmur_store::{ChatStore, Message, NewUser, ProfileUpdate, User};

use crate::auth::Identity;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::{chats, directory, messaging};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ChatStore>, config: ServerConfig) -> Self {
        Self {
            store,
            rate_limiter: RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chats", get(list_chats))
        .route("/api/messages", post(send_message))
        .route("/api/messages/:other_id", get(message_thread))
        .route("/api/users", get(list_users).post(register_user))
        .route("/api/users/:id", get(get_user))
        .route("/api/users/by-username/:username", get(get_user_by_username))
        .route("/api/user", get(current_user))
        .route("/api/user/profile", patch(update_profile))
        .route("/api/user/presence", put(set_presence))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    receiver_id: Option<UserId>,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresenceRequest {
    is_online: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_chats(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Result<Json<Vec<ConversationSummary>>, ServerError> {
    let chats = chats::list_conversations(state.store.as_ref(), user)?;
    Ok(Json(chats))
}

async fn send_message(
    State(state): State<AppState>,
    Identity(sender): Identity,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ServerError> {
    let message = messaging::send_message(
        state.store.as_ref(),
        sender,
        req.receiver_id,
        &req.content,
        state.config.max_message_len,
    )?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn message_thread(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(other_id): Path<String>,
) -> Result<Json<Vec<Message>>, ServerError> {
    let other_id = parse_user_id(&other_id)?;
    let thread = messaging::conversation_thread(state.store.as_ref(), user, other_id)?;
    Ok(Json(thread))
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let user = directory::register_user(state.store.as_ref(), req)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(state): State<AppState>,
    Identity(_): Identity,
) -> Result<Json<Vec<User>>, ServerError> {
    Ok(Json(directory::list_users(state.store.as_ref())?))
}

async fn get_user(
    State(state): State<AppState>,
    Identity(_): Identity,
    Path(id): Path<String>,
) -> Result<Json<User>, ServerError> {
    let id = parse_user_id(&id)?;
    Ok(Json(directory::get_user(state.store.as_ref(), id)?))
}

async fn get_user_by_username(
    State(state): State<AppState>,
    Identity(_): Identity,
    Path(username): Path<String>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(directory::get_user_by_username(
        state.store.as_ref(),
        &username,
    )?))
}

async fn current_user(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Result<Json<User>, ServerError> {
    Ok(Json(directory::get_user(state.store.as_ref(), user)?))
}

async fn update_profile(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(directory::update_profile(
        state.store.as_ref(),
        user,
        update,
    )?))
}

async fn set_presence(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(req): Json<PresenceRequest>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(directory::set_presence(
        state.store.as_ref(),
        user,
        req.is_online,
    )?))
}

/// Path ids are parsed here so a bad id gets the JSON error body.
fn parse_user_id(raw: &str) -> Result<UserId, ServerError> {
    raw.parse::<UserId>()
        .map_err(|_| ServerError::from(ValidationError::InvalidUserId(raw.to_string())))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
