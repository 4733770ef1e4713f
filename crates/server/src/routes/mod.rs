//! Route handlers.

pub mod audit;
pub mod characters;
pub mod chat;
pub mod events;
pub mod health;
pub mod rooms;
pub mod settings;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Characters
        .route("/api/characters", get(characters::list).post(characters::create))
        .route(
            "/api/characters/:id",
            get(characters::get).put(characters::update).delete(characters::delete),
        )
        // Rooms
        .route("/api/rooms", get(rooms::list).post(rooms::create))
        .route(
            "/api/rooms/:id",
            get(rooms::get).put(rooms::update).delete(rooms::delete),
        )
        .route(
            "/api/rooms/:id/participants",
            get(rooms::list_participants).post(rooms::add_participant),
        )
        .route(
            "/api/rooms/:id/participants/:pid",
            delete(rooms::remove_participant),
        )
        .route(
            "/api/rooms/:id/messages",
            get(rooms::list_messages).delete(rooms::reset),
        )
        // Chat
        .route("/api/rooms/:id/chat", post(chat::send))
        .route("/api/rooms/:id/regenerate", post(chat::regenerate))
        .route("/api/rooms/:id/events", get(events::stream))
        .route("/api/messages/:id", put(chat::edit).delete(chat::delete))
        // Audit
        .route("/api/messages/:id/llm-logs", get(audit::llm_logs))
        .route("/api/messages/:id/decisions", get(audit::decisions))
        // Settings
        .route("/api/config", get(settings::get).put(settings::update))
}
