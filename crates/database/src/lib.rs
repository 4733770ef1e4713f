//! SQLite persistence layer for Troupe.
//!
//! This crate provides async database operations for characters, rooms,
//! turns, runtime settings and the orchestration audit trail using SQLx
//! with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{character, participant, room, CharacterInput, Database, ParticipantType, RoomInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:troupe.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Put a character into a room
//!     let alice = character::create_character(db.pool(), &CharacterInput::new("Alice", "A botanist.")).await?;
//!     let tavern = room::create_room(db.pool(), &RoomInput::new("Tavern")).await?;
//!     participant::add_participant(db.pool(), tavern.id, alice.id, ParticipantType::Ai, false).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod call_log;
pub mod character;
pub mod decision;
pub mod error;
pub mod message;
pub mod models;
pub mod participant;
pub mod room;
pub mod settings;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Character, CharacterInput, DecisionWithCall, HistoryEntry, LlmCallLog, Message, MessageView,
    NewCallLog, NewDecision, OrchestratorDecision, ParticipantProfile, ParticipantType, Room,
    RoomInput, RoomParticipant, RoomSummary, Settings,
};
pub use validation::ValidationError;

pub use sqlx::SqlitePool;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough for one writer per concurrently generating participant.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/troupe.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// A room with a user participant and two AI participants.
    async fn seeded_room(db: &Database) -> (Room, RoomParticipant, RoomParticipant, RoomParticipant) {
        let pool = db.pool();
        let room = room::create_room(pool, &RoomInput::new("Tavern")).await.unwrap();

        let mut player = CharacterInput::new("Player", "A wandering bard.");
        player.is_user_playable = true;
        let player = character::create_character(pool, &player).await.unwrap();
        let alice = character::create_character(pool, &CharacterInput::new("Alice Smith", "Botanist"))
            .await
            .unwrap();
        let bob = character::create_character(pool, &CharacterInput::new("Bob Jones", "Smith"))
            .await
            .unwrap();

        let user = participant::add_participant(pool, room.id, player.id, ParticipantType::Human, true)
            .await
            .unwrap();
        let a = participant::add_participant(pool, room.id, alice.id, ParticipantType::Ai, false)
            .await
            .unwrap();
        let b = participant::add_participant(pool, room.id, bob.id, ParticipantType::Ai, false)
            .await
            .unwrap();

        (room, user, a, b)
    }

    #[tokio::test]
    async fn test_character_crud() {
        let db = test_db().await;
        let pool = db.pool();

        // Create
        let created = character::create_character(pool, &CharacterInput::new("Alice", "Botanist"))
            .await
            .unwrap();
        assert_eq!(created.model_name, "gpt-3.5-turbo");
        assert_eq!(created.max_tokens, 1000);

        // Update
        let mut input = CharacterInput::new("Alice", "Retired botanist");
        input.temperature = 1.1;
        let updated = character::update_character(pool, created.id, &input).await.unwrap();
        assert_eq!(updated.prompt, "Retired botanist");
        assert_eq!(updated.temperature, 1.1);

        // List
        let all = character::list_characters(pool).await.unwrap();
        assert_eq!(all.len(), 1);

        // Delete
        character::delete_character(pool, created.id).await.unwrap();
        let result = character::get_character(pool, created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_character_in_room_cannot_be_deleted() {
        let db = test_db().await;
        let (_room, _user, alice, _bob) = seeded_room(&db).await;

        let result = character::delete_character(db.pool(), alice.character_id).await;
        assert!(matches!(result, Err(DatabaseError::InUse { .. })));
    }

    #[tokio::test]
    async fn test_participant_lookups() {
        let db = test_db().await;
        let (room, user, alice, bob) = seeded_room(&db).await;
        let pool = db.pool();

        let ai = participant::ai_participants(pool, room.id).await.unwrap();
        let ids: Vec<i64> = ai.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![alice.id, bob.id]);
        assert_eq!(ai[0].name, "Alice Smith");
        assert!(ai.iter().all(ParticipantProfile::is_ai));

        let found = participant::user_participant(pool, room.id).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.prompt, "A wandering bard.");

        let listed = participant::list_participants(pool, room.id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].participant_type, ParticipantType::Human);
    }

    #[tokio::test]
    async fn test_duplicate_participant_rejected() {
        let db = test_db().await;
        let (room, _user, alice, _bob) = seeded_room(&db).await;

        let result = participant::add_participant(
            db.pool(),
            room.id,
            alice.character_id,
            ParticipantType::Ai,
            false,
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_recent_history_is_chronological_and_bounded() {
        let db = test_db().await;
        let (room, user, alice, _bob) = seeded_room(&db).await;
        let pool = db.pool();

        for i in 0..5 {
            message::insert_message(pool, room.id, user.id, &format!("u{i}")).await.unwrap();
            message::insert_message(pool, room.id, alice.id, &format!("a{i}")).await.unwrap();
        }

        let history = message::recent_history(pool, room.id, 4).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["u3", "a3", "u4", "a4"]);
        assert_eq!(history[1].participant_name, "Alice Smith");
        assert_eq!(history[1].participant_type, ParticipantType::Ai);
    }

    #[tokio::test]
    async fn test_message_view_and_edit() {
        let db = test_db().await;
        let (room, user, alice, _bob) = seeded_room(&db).await;
        let pool = db.pool();

        let human = message::insert_message(pool, room.id, user.id, "hello").await.unwrap();
        let reply = message::insert_message(pool, room.id, alice.id, "hi").await.unwrap();

        let view = message::get_message_view(pool, reply.id).await.unwrap();
        assert!(view.is_ai);
        assert_eq!(view.participant_name, "Alice Smith");
        assert!(!message::get_message_view(pool, human.id).await.unwrap().is_ai);

        let edited = message::update_message_content(pool, reply.id, "hey").await.unwrap();
        assert_eq!(edited.content, "hey");

        let deleted = message::delete_message(pool, human.id).await.unwrap();
        assert_eq!(deleted.room_id, room.id);
        assert_eq!(message::list_messages(pool, room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_ai_messages_after_latest_user_turn() {
        let db = test_db().await;
        let (room, user, alice, bob) = seeded_room(&db).await;
        let pool = db.pool();

        message::insert_message(pool, room.id, user.id, "first").await.unwrap();
        let kept = message::insert_message(pool, room.id, alice.id, "old reply").await.unwrap();
        let latest = message::insert_message(pool, room.id, user.id, "second").await.unwrap();
        let r1 = message::insert_message(pool, room.id, alice.id, "r1").await.unwrap();
        let r2 = message::insert_message(pool, room.id, bob.id, "r2").await.unwrap();

        let found = message::latest_user_message(pool, room.id).await.unwrap().unwrap();
        assert_eq!(found.id, latest.id);

        let deleted = message::delete_ai_messages_after(pool, room.id, latest.id).await.unwrap();
        assert_eq!(deleted, vec![r1.id, r2.id]);

        let remaining: Vec<i64> = message::list_messages(pool, room.id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert!(remaining.contains(&kept.id));
        assert!(remaining.contains(&latest.id));
        assert_eq!(remaining.len(), 3);
    }

    #[tokio::test]
    async fn test_decisions_with_calls() {
        let db = test_db().await;
        let (room, user, _alice, _bob) = seeded_room(&db).await;
        let pool = db.pool();
        let turn = message::insert_message(pool, room.id, user.id, "hello").await.unwrap();

        assert_eq!(decision::max_step_order(pool, turn.id).await.unwrap(), 0);

        let call_id = call_log::insert_call_log(
            pool,
            &NewCallLog {
                message_id: turn.id,
                room_id: room.id,
                call_type: "intent_analysis",
                model_name: "gpt-3.5-turbo",
                temperature: 0.1,
                max_tokens: 100,
                request_body: "{}",
                response_body: Some("INTENT: group"),
                prompt_tokens: 12,
                completion_tokens: 4,
                latency_ms: 30,
                error_message: None,
            },
        )
        .await
        .unwrap();

        for (order, step_type, call) in [
            (1, "parse_mentions", None),
            (2, "intent_analysis", Some(call_id)),
        ] {
            decision::insert_decision(
                pool,
                &NewDecision {
                    message_id: turn.id,
                    room_id: room.id,
                    step_order: order,
                    step_type,
                    input_data: "{}",
                    output_data: "{}",
                    llm_call_log_id: call,
                    reason: "",
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(decision::max_step_order(pool, turn.id).await.unwrap(), 2);

        let joined = decision::list_decisions_with_calls(pool, turn.id).await.unwrap();
        assert_eq!(joined.len(), 2);
        assert!(joined[0].llm_call.is_none());
        let call = joined[1].llm_call.as_ref().unwrap();
        assert_eq!(call.prompt_tokens, 12);
        assert_eq!(call.response_body.as_deref(), Some("INTENT: group"));
    }

    #[tokio::test]
    async fn test_duplicate_step_order_rejected() {
        let db = test_db().await;
        let (room, user, _alice, _bob) = seeded_room(&db).await;
        let pool = db.pool();
        let turn = message::insert_message(pool, room.id, user.id, "hello").await.unwrap();

        let step = NewDecision {
            message_id: turn.id,
            room_id: room.id,
            step_order: 1,
            step_type: "parse_mentions",
            input_data: "{}",
            output_data: "{}",
            llm_call_log_id: None,
            reason: "",
        };
        decision::insert_decision(pool, &step).await.unwrap();
        let err = decision::insert_decision(pool, &step).await.unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_settings_default_and_update() {
        let db = test_db().await;
        let pool = db.pool();

        let defaults = settings::get_settings(pool).await.unwrap();
        assert_eq!(defaults.api_endpoint, "https://api.openai.com/v1");
        assert_eq!(defaults.default_model, "gpt-3.5-turbo");
        assert!(defaults.api_key.is_empty());

        let updated = settings::update_settings(
            pool,
            &Settings {
                api_endpoint: "http://localhost:11434/v1".to_string(),
                api_key: "secret".to_string(),
                default_model: "llama3".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.default_model, "llama3");
    }

    #[tokio::test]
    async fn test_room_summary_and_cascade() {
        let db = test_db().await;
        let (room, user, _alice, _bob) = seeded_room(&db).await;
        let pool = db.pool();
        message::insert_message(pool, room.id, user.id, "hello").await.unwrap();

        let rooms = room::list_rooms(pool).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].participant_count, 3);
        assert!(rooms[0].last_activity.is_some());

        room::delete_room(pool, room.id).await.unwrap();
        assert!(participant::list_participants(pool, room.id).await.unwrap().is_empty());
        assert!(message::list_messages(pool, room.id).await.unwrap().is_empty());
    }
}
