//! Recipient suggestions for the username field
//!
//! Placeholder resolver: candidates are synthesized from the typed handle, nothing is
//! looked up. `verified` and the display names are fixture values with no policy behind
//! them.

use serde::Serialize;

/// Shortest handle that produces suggestions
pub const MIN_LOOKUP_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientCandidate {
    pub handle: String,
    pub display_name: String,
    pub verified: bool,
}

impl RecipientCandidate {
    pub fn initial(&self) -> char {
        self.display_name.chars().next().unwrap_or('@')
    }
}

/// Same input, same output: the handle itself, then the handle with a numeric suffix.
pub fn resolve_candidates(handle: &str) -> Vec<RecipientCandidate> {
    if handle.chars().count() < MIN_LOOKUP_LEN {
        return Vec::new();
    }

    vec![
        RecipientCandidate {
            handle: handle.to_string(),
            display_name: "John Doe".to_string(),
            verified: true,
        },
        RecipientCandidate {
            handle: format!("{}123", handle),
            display_name: "Jane Smith".to_string(),
            verified: false,
        },
    ]
}
