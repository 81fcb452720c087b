use serde::{Deserialize, Serialize};

/// Home-page listing filters for questions.
///
/// The repository builds its filter and sort documents from this enum
/// instead of accepting caller-assembled query fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionListFilter {
    /// Most recently asked first.
    Newest,
    /// Most viewed first.
    Frequent,
    /// Only questions without answers.
    Unanswered,
}

impl QuestionListFilter {
    /// Parse a filter from a query parameter (case-insensitive). Unknown
    /// values mean "no filter", matching the original listing behavior.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "newest" => Some(QuestionListFilter::Newest),
            "frequent" => Some(QuestionListFilter::Frequent),
            "unanswered" => Some(QuestionListFilter::Unanswered),
            _ => None,
        }
    }
}

/// A fully-specified question listing request, as consumed by
/// `QuestionRepository::list`.
#[derive(Debug, Clone, Default)]
pub struct QuestionListQuery {
    /// Case-insensitive substring to match against title or content.
    pub search: Option<String>,
    pub filter: Option<QuestionListFilter>,
    pub skip: u64,
    pub limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_str_ci() {
        assert_eq!(
            QuestionListFilter::from_str_ci("Newest"),
            Some(QuestionListFilter::Newest)
        );
        assert_eq!(
            QuestionListFilter::from_str_ci("UNANSWERED"),
            Some(QuestionListFilter::Unanswered)
        );
        assert_eq!(QuestionListFilter::from_str_ci("recommended"), None);
    }
}
