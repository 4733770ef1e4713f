//! Merging candidate responders with forced directives.

use std::collections::HashSet;

use serde::Serialize;
use troupe_database::ParticipantProfile;

use crate::matcher::matches;

/// Why a participant ended up in the responder set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// No candidates were given, so every AI participant was included.
    DefaultAll,
    /// Chosen by the intent classification call.
    IntentSelected,
    /// Chosen by the fallback selection call or the deterministic pick.
    FallbackSelected,
    /// Named by an `@` directive.
    ForcedInclude,
}

/// One chosen responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selected {
    pub participant_id: i64,
    pub provenance: Provenance,
}

/// Outcome of a merge, in participant order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    pub selected: Vec<Selected>,
    /// Participants removed by `!` directives.
    pub force_excluded: Vec<i64>,
}

impl SelectionResult {
    /// IDs of the chosen responders.
    pub fn ids(&self) -> Vec<i64> {
        self.selected.iter().map(|s| s.participant_id).collect()
    }

    pub fn contains(&self, participant_id: i64) -> bool {
        self.selected.iter().any(|s| s.participant_id == participant_id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// IDs that were added by `@` directives.
    pub fn forced_ids(&self) -> Vec<i64> {
        self.selected
            .iter()
            .filter(|s| s.provenance == Provenance::ForcedInclude)
            .map(|s| s.participant_id)
            .collect()
    }
}

/// IDs of every participant any of `tokens` resolves to.
pub fn resolve(tokens: &[String], participants: &[ParticipantProfile]) -> HashSet<i64> {
    participants
        .iter()
        .filter(|p| tokens.iter().any(|t| matches(t, &p.name)))
        .map(|p| p.id)
        .collect()
}

/// Combine candidates with include and exclude directives.
///
/// Empty `candidates` means every participant. Includes are added, then
/// excludes removed, so an exclude always beats an include for the same
/// participant. Candidate IDs that are not participants are ignored.
pub fn merge(
    candidates: &[i64],
    source: Provenance,
    include: &[String],
    exclude: &[String],
    participants: &[ParticipantProfile],
) -> SelectionResult {
    let (candidates, source): (HashSet<i64>, Provenance) = if candidates.is_empty() {
        (participants.iter().map(|p| p.id).collect(), Provenance::DefaultAll)
    } else {
        (candidates.iter().copied().collect(), source)
    };
    let included = resolve(include, participants);
    let excluded = resolve(exclude, participants);

    let mut result = SelectionResult::default();
    for participant in participants {
        let id = participant.id;
        if excluded.contains(&id) {
            result.force_excluded.push(id);
            continue;
        }

        let provenance = if included.contains(&id) {
            Provenance::ForcedInclude
        } else if candidates.contains(&id) {
            source
        } else {
            continue;
        };
        result.selected.push(Selected {
            participant_id: id,
            provenance,
        });
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use troupe_database::ParticipantType;

    pub(crate) fn profile(id: i64, name: &str) -> ParticipantProfile {
        ParticipantProfile {
            id,
            room_id: 1,
            character_id: id,
            name: name.to_string(),
            avatar: String::new(),
            prompt: format!("{name} persona"),
            participant_type: ParticipantType::Ai,
            is_user: false,
            model_name: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 256,
        }
    }

    fn trio() -> Vec<ParticipantProfile> {
        vec![profile(3, "Alice"), profile(4, "Bob"), profile(5, "Carol")]
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_candidates_default_to_all() {
        let result = merge(&[], Provenance::IntentSelected, &[], &[], &trio());
        assert_eq!(result.ids(), vec![3, 4, 5]);
        assert!(result
            .selected
            .iter()
            .all(|s| s.provenance == Provenance::DefaultAll));
    }

    #[test]
    fn test_exclude_beats_include() {
        let result = merge(
            &[4],
            Provenance::IntentSelected,
            &tokens(&["Bob"]),
            &tokens(&["bob"]),
            &trio(),
        );
        assert!(!result.contains(4));
        assert_eq!(result.force_excluded, vec![4]);
    }

    #[test]
    fn test_mention_scenario_pre_intent() {
        let result = merge(&[], Provenance::DefaultAll, &tokens(&["Alice"]), &tokens(&["Bob"]), &trio());
        assert_eq!(result.ids(), vec![3, 5]);
        assert_eq!(result.forced_ids(), vec![3]);
    }

    #[test]
    fn test_forced_include_added_to_candidates() {
        let result = merge(&[5], Provenance::IntentSelected, &tokens(&["alice"]), &[], &trio());
        assert_eq!(
            result.selected,
            vec![
                Selected {
                    participant_id: 3,
                    provenance: Provenance::ForcedInclude
                },
                Selected {
                    participant_id: 5,
                    provenance: Provenance::IntentSelected
                },
            ]
        );
    }

    #[test]
    fn test_unknown_candidates_ignored_and_order_follows_participants() {
        let result = merge(&[99, 5, 3], Provenance::FallbackSelected, &[], &[], &trio());
        assert_eq!(result.ids(), vec![3, 5]);
    }

    #[test]
    fn test_no_participants() {
        let result = merge(&[], Provenance::DefaultAll, &tokens(&["alice"]), &[], &[]);
        assert!(result.is_empty());
    }
}
