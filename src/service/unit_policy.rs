use serde::{Deserialize, Serialize};

/// Decides which part of the text around a price triple is the unit.
pub trait UnitPolicy: Send + Sync {
    /// Split the text preceding the triple into `(designation, unit)`.
    fn split_leading(&self, before: &str) -> (Option<String>, Option<String>);

    /// Unit candidate taken from the text following the triple.
    fn trailing_unit(&self, after: &str) -> Option<String>;
}

/// Last whitespace-delimited token is the unit when it is short and not digit-led.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingTokenPolicy {
    pub max_unit_chars: usize,
    pub allow_digit_led: bool,
    pub max_trailing_chars: usize,
}

impl Default for TrailingTokenPolicy {
    fn default() -> Self {
        Self {
            max_unit_chars: 20,
            allow_digit_led: false,
            max_trailing_chars: 50,
        }
    }
}

impl TrailingTokenPolicy {
    fn accepts(&self, token: &str) -> bool {
        let digit_led = token.chars().next().is_some_and(|c| c.is_numeric());
        token.chars().count() <= self.max_unit_chars && (self.allow_digit_led || !digit_led)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl UnitPolicy for TrailingTokenPolicy {
    fn split_leading(&self, before: &str) -> (Option<String>, Option<String>) {
        let before = before.trim();
        match before.rsplit_once(char::is_whitespace) {
            Some((head, token)) if self.accepts(token) => (non_empty(head), non_empty(token)),
            Some(_) => (non_empty(before), None),
            // single word: designation only
            None => (non_empty(before), None),
        }
    }

    fn trailing_unit(&self, after: &str) -> Option<String> {
        let truncated: String = after.trim().chars().take(self.max_trailing_chars).collect();
        non_empty(&truncated)
    }
}
