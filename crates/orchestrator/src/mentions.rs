//! `@name` / `!name` directive extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\S+)").expect("valid regex"));
static EXCLUDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!(\S+)").expect("valid regex"));

/// Directives found in a turn, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mentions {
    /// Tokens following `@`: these participants must respond.
    #[serde(rename = "force_include")]
    pub include: Vec<String>,
    /// Tokens following `!`: these participants must stay silent.
    #[serde(rename = "force_exclude")]
    pub exclude: Vec<String>,
}

impl Mentions {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Extract include and exclude tokens from turn text.
pub fn extract(text: &str) -> Mentions {
    let capture = |re: &Regex| {
        re.captures_iter(text)
            .map(|c| c[1].to_string())
            .collect::<Vec<_>>()
    };

    Mentions {
        include: capture(&INCLUDE),
        exclude: capture(&EXCLUDE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_include_and_exclude() {
        let mentions = extract("@Alice how are you? !Bob");
        assert_eq!(mentions.include, vec!["Alice"]);
        assert_eq!(mentions.exclude, vec!["Bob"]);
    }

    #[test]
    fn test_extract_keeps_order_and_punctuation() {
        let mentions = extract("@Carol, @dr.smith and @Alice! stay quiet !Bob !Eve.");
        assert_eq!(mentions.include, vec!["Carol,", "dr.smith", "Alice!"]);
        assert_eq!(mentions.exclude, vec!["Bob", "Eve."]);
    }

    #[test]
    fn test_empty_and_plain_text() {
        assert!(extract("").is_empty());
        assert!(extract("hello everyone").is_empty());
        // Bare markers carry no token.
        assert!(extract("wait @ what !").is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(extract("@a !b")).unwrap();
        assert_eq!(json["force_include"][0], "a");
        assert_eq!(json["force_exclude"][0], "b");
    }
}
