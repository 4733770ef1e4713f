//! Per-responder conversation context.
//!
//! The same history reads differently for each responder: its own lines are
//! assistant turns, everyone else's are name-prefixed user turns.

use completion_core::ChatMessage;
use troupe_database::{message, HistoryEntry, ParticipantType, Result, SqlitePool};

/// Label history from the point of view of `responder_name`.
pub fn label_history(history: &[HistoryEntry], responder_name: &str) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|entry| {
            let own = entry.participant_type == ParticipantType::Ai
                && same_name(&entry.participant_name, responder_name);

            if own {
                ChatMessage::assistant(strip_self_prefix(&entry.content, &entry.participant_name))
            } else {
                ChatMessage::user(format!("{}: {}", entry.participant_name, entry.content))
            }
        })
        .collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Drop a legacy "Name: " prefix a responder may have written into its own line.
fn strip_self_prefix<'a>(content: &'a str, name: &str) -> &'a str {
    content
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(": "))
        .unwrap_or(content)
}

/// Load the recent history of a room and label it for one responder.
pub async fn build_context(
    pool: &SqlitePool,
    room_id: i64,
    responder_name: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>> {
    let history = message::recent_history(pool, room_id, limit).await?;
    Ok(label_history(&history, responder_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_core::Role;

    fn entry(id: i64, name: &str, kind: ParticipantType, content: &str) -> HistoryEntry {
        HistoryEntry {
            message_id: id,
            participant_name: name.to_string(),
            participant_type: kind,
            content: content.to_string(),
        }
    }

    fn five_turns() -> Vec<HistoryEntry> {
        vec![
            entry(1, "Player", ParticipantType::Human, "Hello both"),
            entry(2, "Alice", ParticipantType::Ai, "Hi there"),
            entry(3, "Bob", ParticipantType::Ai, "Evening"),
            entry(4, "Player", ParticipantType::Human, "How was the day?"),
            entry(5, "Alice", ParticipantType::Ai, "Alice: Busy!"),
        ]
    }

    #[test]
    fn test_labels_depend_on_responder() {
        let history = five_turns();

        let for_alice = label_history(&history, "alice");
        let roles: Vec<Role> = for_alice.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::User, Role::Assistant]
        );
        assert_eq!(for_alice[1].content, "Hi there");
        assert_eq!(for_alice[2].content, "Bob: Evening");
        assert_eq!(for_alice[4].content, "Busy!");

        let for_bob = label_history(&history, "Bob");
        let roles: Vec<Role> = for_bob.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::User, Role::Assistant, Role::User, Role::User]
        );
        assert_eq!(for_bob[1].content, "Alice: Hi there");
        assert_eq!(for_bob[4].content, "Alice: Alice: Busy!");
    }

    #[test]
    fn test_human_turns_are_always_prefixed() {
        let history = vec![entry(1, "Alice", ParticipantType::Human, "I share a name")];
        let labeled = label_history(&history, "Alice");
        assert_eq!(labeled[0].role, Role::User);
        assert_eq!(labeled[0].content, "Alice: I share a name");
    }

    #[test]
    fn test_non_ascii_names_match_ignoring_case() {
        let history = vec![
            entry(1, "Élodie", ParticipantType::Ai, "Élodie: Bonsoir"),
            entry(2, "Ödön", ParticipantType::Ai, "Jó estét"),
        ];

        let labeled = label_history(&history, "éLODIE");
        assert_eq!(labeled[0].role, Role::Assistant);
        assert_eq!(labeled[0].content, "Bonsoir");
        assert_eq!(labeled[1].role, Role::User);
        assert_eq!(labeled[1].content, "Ödön: Jó estét");
    }

    #[test]
    fn test_empty_history() {
        assert!(label_history(&[], "Alice").is_empty());
    }
}
