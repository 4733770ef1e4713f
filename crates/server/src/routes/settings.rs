//! Runtime completion settings.

use axum::extract::State;
use axum::Json;
use database::validation::validate_settings;
use database::{settings, Settings};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Settings as shown to clients. The key itself is never returned.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub api_endpoint: String,
    pub default_model: String,
    pub api_key_set: bool,
}

impl From<Settings> for SettingsView {
    fn from(s: Settings) -> Self {
        Self {
            api_key_set: !s.api_key.is_empty(),
            api_endpoint: s.api_endpoint,
            default_model: s.default_model,
        }
    }
}

/// Settings update. A missing `api_key` keeps the stored one.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub api_endpoint: String,
    pub default_model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

pub async fn get(State(state): State<AppState>) -> Result<Json<SettingsView>> {
    Ok(Json(settings::get_settings(state.db.pool()).await?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>> {
    let pool = state.db.pool();
    let api_key = match req.api_key {
        Some(key) => key,
        None => settings::get_settings(pool).await?.api_key,
    };
    let next = Settings {
        api_endpoint: req.api_endpoint.trim().to_string(),
        api_key,
        default_model: req.default_model.trim().to_string(),
    };
    validate_settings(&next)?;

    let saved = settings::update_settings(pool, &next).await?;
    state.settings_sink.apply(&saved);
    info!(endpoint = %saved.api_endpoint, model = %saved.default_model, "Settings updated");

    Ok(Json(saved.into()))
}
