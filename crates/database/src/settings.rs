//! Runtime settings for the completion service.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Settings;

/// Load the settings row.
pub async fn get_settings(pool: &SqlitePool) -> Result<Settings> {
    let settings = sqlx::query_as::<_, Settings>(
        r#"
        SELECT api_endpoint, api_key, default_model
        FROM settings
        WHERE id = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(settings)
}

/// Replace the settings row.
pub async fn update_settings(pool: &SqlitePool, settings: &Settings) -> Result<Settings> {
    sqlx::query(
        r#"
        INSERT INTO settings (id, api_endpoint, api_key, default_model)
        VALUES (1, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            api_endpoint = excluded.api_endpoint,
            api_key = excluded.api_key,
            default_model = excluded.default_model
        "#,
    )
    .bind(&settings.api_endpoint)
    .bind(&settings.api_key)
    .bind(&settings.default_model)
    .execute(pool)
    .await?;

    get_settings(pool).await
}
