use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

const WILDCARD: &str = "_";

/* Published */
pub const ALIVE: &[&str] = &["Alive", "Postmarks"];
pub const HERE: &[&str] = &["Here", "Postmarks"];
pub const DEAD: &[&str] = &["Dead", "Postmarks"];
pub const CONFIG_REQUEST: &[&str] = &["_", "CFG", "Request", "Postmarks"];
pub const POSTMARK_RESPONSE: &[&str] = &["Postmark", "Response"];
pub const CONFIG_ERROR: &[&str] = &["Error", "Postmarks", "Config"];
pub const REQUEST_ERROR: &[&str] = &["Error", "Postmarks", "Request"];

/* Subscribed */
pub const CONFIG: &[&str] = &["CFG", "Postmarks"];
pub const POSTMARK_REQUEST: &[&str] = &["_", "Postmark", "Request"];

/// A bus subject, a sequence of tokens like `CFG.Postmarks`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Subject(Vec<String>);

impl Subject {
    pub fn new(tokens: &[&str]) -> Self {
        Self(tokens.iter().map(|token| token.to_string()).collect())
    }

    /// Treats `self` as a pattern in which `_` stands for any single token.
    pub fn matches(&self, subject: &Subject) -> bool {
        self.0.len() == subject.0.len()
            && self
                .0
                .iter()
                .zip(&subject.0)
                .all(|(pattern, token)| pattern == WILDCARD || pattern == token)
    }
}

impl Display for Subject {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_single_token() {
        let pattern = Subject::new(POSTMARK_REQUEST);
        assert!(pattern.matches(&Subject::new(&["Gateway", "Postmark", "Request"])));
        assert!(pattern.matches(&Subject::new(&["_", "Postmark", "Request"])));
        assert!(!pattern.matches(&Subject::new(&["Postmark", "Request"])));
        assert!(!pattern.matches(&Subject::new(&["A", "B", "Postmark", "Request"])));
        assert!(!pattern.matches(&Subject::new(&["Gateway", "Postmark", "Response"])));
    }

    #[test]
    fn test_exact_match() {
        let pattern = Subject::new(CONFIG);
        assert!(pattern.matches(&Subject::new(&["CFG", "Postmarks"])));
        assert!(!pattern.matches(&Subject::new(&["CFG", "Updates"])));
        assert_eq!(pattern.to_string(), "CFG.Postmarks");
    }
}
