use serde::{Deserialize, Serialize};

/// The entity types the global search can be filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Question,
    User,
    Answer,
    Tag,
}

impl SearchKind {
    /// Parse a type filter from a query parameter (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "question" => Some(SearchKind::Question),
            "user" => Some(SearchKind::User),
            "answer" => Some(SearchKind::Answer),
            "tag" => Some(SearchKind::Tag),
            _ => None,
        }
    }

    /// All kinds, in the order unfiltered search reports them.
    pub fn all() -> [SearchKind; 4] {
        [
            SearchKind::Question,
            SearchKind::User,
            SearchKind::Answer,
            SearchKind::Tag,
        ]
    }
}

/// One normalized global-search match.
///
/// `id` is whatever the UI needs to navigate to the result: the question id
/// for questions *and* answers (answers have no page of their own), the
/// external auth id for users, the tag id for tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub id: String,
}
