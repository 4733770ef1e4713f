//! Input validation for user-supplied records.

use std::fmt;

use crate::models::{CharacterInput, RoomInput, Settings};

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Number outside the accepted range.
    OutOfRange { field: String, min: f64, max: f64, actual: f64 },
    /// Invalid endpoint URL.
    InvalidEndpoint(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
            ValidationError::InvalidEndpoint(msg) => write!(f, "Invalid API endpoint: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for character and room names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum allowed length for persona, setting and message text.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Maximum allowed length for avatars (emoji or URL).
pub const MAX_AVATAR_LENGTH: usize = 2048;

/// Maximum allowed length for room descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum allowed length for model names.
pub const MAX_MODEL_LENGTH: usize = 64;

/// Accepted sampling temperature range.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Largest accepted token budget.
pub const MAX_TOKEN_BUDGET: i64 = 32_768;

fn required(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    bounded(field, value, max)
}

fn bounded(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

/// Validate a character definition.
pub fn validate_character(input: &CharacterInput) -> Result<(), ValidationError> {
    required("name", &input.name, MAX_NAME_LENGTH)?;
    bounded("avatar", &input.avatar, MAX_AVATAR_LENGTH)?;
    bounded("prompt", &input.prompt, MAX_TEXT_LENGTH)?;
    required("model_name", &input.model_name, MAX_MODEL_LENGTH)?;

    let (min, max) = TEMPERATURE_RANGE;
    if !(min..=max).contains(&input.temperature) {
        return Err(ValidationError::OutOfRange {
            field: "temperature".to_string(),
            min,
            max,
            actual: input.temperature,
        });
    }

    if input.max_tokens < 1 || input.max_tokens > MAX_TOKEN_BUDGET {
        return Err(ValidationError::OutOfRange {
            field: "max_tokens".to_string(),
            min: 1.0,
            max: MAX_TOKEN_BUDGET as f64,
            actual: input.max_tokens as f64,
        });
    }

    Ok(())
}

/// Validate a room definition.
pub fn validate_room(input: &RoomInput) -> Result<(), ValidationError> {
    required("name", &input.name, MAX_NAME_LENGTH)?;
    bounded("description", &input.description, MAX_DESCRIPTION_LENGTH)?;
    bounded("setting", &input.setting, MAX_TEXT_LENGTH)
}

/// Validate the text of a turn.
pub fn validate_message_content(content: &str) -> Result<(), ValidationError> {
    required("content", content, MAX_TEXT_LENGTH)
}

/// Validate runtime settings.
pub fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    let endpoint = settings.api_endpoint.trim();
    if endpoint.is_empty() {
        return Err(ValidationError::Empty("api_endpoint".to_string()));
    }
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ValidationError::InvalidEndpoint(
            "must start with http:// or https://".to_string(),
        ));
    }
    required("default_model", &settings.default_model, MAX_MODEL_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_character() {
        let input = CharacterInput::new("Alice", "A cheerful botanist.");
        assert!(validate_character(&input).is_ok());
    }

    #[test]
    fn test_character_name_required() {
        let input = CharacterInput::new("   ", "x");
        assert_eq!(
            validate_character(&input),
            Err(ValidationError::Empty("name".to_string()))
        );
    }

    #[test]
    fn test_character_name_too_long() {
        let input = CharacterInput::new("a".repeat(MAX_NAME_LENGTH + 1), "x");
        assert!(matches!(
            validate_character(&input),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_character_temperature_range() {
        let mut input = CharacterInput::new("Alice", "x");
        input.temperature = 2.5;
        assert!(matches!(
            validate_character(&input),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "temperature"
        ));

        input.temperature = 0.0;
        assert!(validate_character(&input).is_ok());
    }

    #[test]
    fn test_character_token_budget_positive() {
        let mut input = CharacterInput::new("Alice", "x");
        input.max_tokens = 0;
        assert!(matches!(
            validate_character(&input),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "max_tokens"
        ));
    }

    #[test]
    fn test_room_validation() {
        assert!(validate_room(&RoomInput::new("Tavern")).is_ok());
        assert!(validate_room(&RoomInput::new("")).is_err());

        let mut room = RoomInput::new("Tavern");
        room.description = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_room(&room).is_err());
    }

    #[test]
    fn test_message_content() {
        assert!(validate_message_content("hello").is_ok());
        assert!(validate_message_content(" \n ").is_err());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings {
            api_endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            default_model: "gpt-4o-mini".to_string(),
        };
        assert!(validate_settings(&settings).is_ok());

        settings.api_endpoint = "ftp://example.com".to_string();
        assert!(matches!(
            validate_settings(&settings),
            Err(ValidationError::InvalidEndpoint(_))
        ));

        settings.api_endpoint = "http://localhost:11434/v1".to_string();
        settings.default_model = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
            actual: 120,
        };
        assert_eq!(err.to_string(), "name is too long (120 chars, max 100)");
    }
}
