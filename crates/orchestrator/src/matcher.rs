//! Permissive name matching for `@` / `!` directives.
//!
//! Rules are evaluated in a fixed order; the first rule that fires wins.
//! Matching favors recall: a token may resolve to several participants.

/// Honorifics removed from the front of a token or display name.
const HONORIFICS: &[&str] = &["mrs", "miss", "mr", "ms", "dr", "prof"];

/// Which rule matched a token to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Token equals the whole display name.
    FullName,
    /// Token equals the first name.
    FirstName,
    /// Token equals the last name.
    LastName,
    /// Token is a prefix of the first or last name.
    NamePrefix,
    /// Token appears anywhere in the display name.
    Substring,
}

struct NameParts {
    full: String,
    first: String,
    last: Option<String>,
}

impl NameParts {
    fn new(display_name: &str) -> Option<Self> {
        let lowered = display_name.trim().to_lowercase();
        let stripped = strip_honorific(&lowered);
        let words: Vec<&str> = stripped
            .split_whitespace()
            .map(trim_punctuation)
            .filter(|w| !w.is_empty())
            .collect();

        let first = words.first()?.to_string();
        let last = (words.len() > 1).then(|| words[words.len() - 1].to_string());

        Some(Self {
            full: lowered,
            first,
            last,
        })
    }
}

type RuleFn = fn(&str, &NameParts) -> bool;

const RULES: &[(MatchRule, RuleFn)] = &[
    (MatchRule::FullName, full_name),
    (MatchRule::FirstName, first_name),
    (MatchRule::LastName, last_name),
    (MatchRule::NamePrefix, name_prefix),
    (MatchRule::Substring, substring),
];

fn full_name(token: &str, name: &NameParts) -> bool {
    name.full == token || strip_honorific(&name.full) == token
}

fn first_name(token: &str, name: &NameParts) -> bool {
    name.first == token
}

fn last_name(token: &str, name: &NameParts) -> bool {
    name.last.as_deref() == Some(token)
}

fn name_prefix(token: &str, name: &NameParts) -> bool {
    name.first.starts_with(token)
        || name.last.as_deref().is_some_and(|last| last.starts_with(token))
}

fn substring(token: &str, name: &NameParts) -> bool {
    name.full.contains(token)
}

fn trim_punctuation(s: &str) -> &str {
    s.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Remove one leading honorific followed by `.` or whitespace.
fn strip_honorific(s: &str) -> &str {
    for title in HONORIFICS {
        if let Some(rest) = s.strip_prefix(title) {
            if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(' ')) {
                return rest.trim_start();
            }
        }
    }
    s
}

/// Normalize a directive token: lowercase, drop a leading honorific and
/// surrounding punctuation.
pub fn normalize_token(token: &str) -> String {
    let lowered = token.trim().to_lowercase();
    let lowered = lowered.trim_start_matches(|c: char| !c.is_alphanumeric());
    trim_punctuation(strip_honorific(lowered)).to_string()
}

/// Return the first rule under which `token` refers to `display_name`.
pub fn match_rule(token: &str, display_name: &str) -> Option<MatchRule> {
    let token = normalize_token(token);
    if token.is_empty() {
        return None;
    }
    let name = NameParts::new(display_name)?;

    RULES
        .iter()
        .find(|(_, rule)| rule(&token, &name))
        .map(|(kind, _)| *kind)
}

/// Whether `token` refers to `display_name`.
pub fn matches(token: &str, display_name: &str) -> bool {
    match_rule(token, display_name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_precedence() {
        let cases = [
            ("Alice Smith", "Alice Smith", Some(MatchRule::FullName)),
            ("alice", "Alice Smith", Some(MatchRule::FirstName)),
            ("SMITH", "Alice Smith", Some(MatchRule::LastName)),
            ("Ali", "Alice Smith", Some(MatchRule::NamePrefix)),
            ("Smi", "Alice Smith", Some(MatchRule::NamePrefix)),
            ("ice", "Alice Smith", Some(MatchRule::Substring)),
            ("bob", "Alice Smith", None),
        ];

        for (token, name, expected) in cases {
            assert_eq!(match_rule(token, name), expected, "{token} vs {name}");
        }
    }

    #[test]
    fn test_single_word_name_has_no_last_name() {
        assert_eq!(match_rule("alice", "Alice"), Some(MatchRule::FullName));
        assert_eq!(match_rule("al", "Alice"), Some(MatchRule::NamePrefix));
    }

    #[test]
    fn test_honorifics_are_stripped() {
        assert_eq!(match_rule("Dr.Smith", "Alice Smith"), Some(MatchRule::LastName));
        assert_eq!(match_rule("dr. smith", "Alice Smith"), Some(MatchRule::LastName));
        assert_eq!(match_rule("Mrs.Jones", "Bob Jones"), Some(MatchRule::LastName));
        assert_eq!(match_rule("prof watson", "Prof. Emma Watson"), Some(MatchRule::LastName));
        assert_eq!(match_rule("emma", "Prof. Emma Watson"), Some(MatchRule::FirstName));
        // "miss" is not followed by a separator here, so it stays a name.
        assert_eq!(match_rule("missy", "Missy Elliott"), Some(MatchRule::FirstName));
    }

    #[test]
    fn test_surrounding_punctuation_is_ignored() {
        assert_eq!(match_rule("Alice,", "Alice Smith"), Some(MatchRule::FirstName));
        assert_eq!(match_rule("(Bob)!", "Bob Jones"), Some(MatchRule::FirstName));
    }

    #[test]
    fn test_empty_tokens_match_nothing() {
        assert!(!matches("", "Alice"));
        assert!(!matches("!!", "Alice"));
        assert!(!matches("Dr.", "Dr. Alice"));
        assert!(!matches("alice", "   "));
    }

    #[test]
    fn test_token_can_match_many_names() {
        let names = ["Alice Smith", "Alicia Keys", "Bob Jones"];
        let hits: Vec<&str> = names.iter().copied().filter(|n| matches("ali", n)).collect();
        assert_eq!(hits, vec!["Alice Smith", "Alicia Keys"]);
    }
}
