use serde::Deserialize;

use crate::db::answer_repository::AnswerRepository;
use crate::db::question_repository::QuestionRepository;
use crate::db::tag_repository::TagRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::search::{SearchKind, SearchResult};

/// Per-type result cap when searching across everything.
const UNFILTERED_LIMIT: u64 = 2;
/// Result cap when the search is filtered to one type.
const FILTERED_LIMIT: u64 = 8;

/// Fan a query out across the searchable collections and normalize the
/// hits into one flat list.
///
/// Without a type filter every collection is probed with a small per-type
/// cap; with one, only that collection, with a larger cap. An unsupported
/// filter value is rejected rather than silently widened.
pub async fn process_global_search(
    questions: &dyn QuestionRepository,
    users: &dyn UserRepository,
    answers: &dyn AnswerRepository,
    tags: &dyn TagRepository,
    query: &str,
    type_filter: Option<&str>,
) -> Result<Vec<SearchResult>, AppError> {
    let filter = match type_filter.filter(|t| !t.is_empty()) {
        Some(raw) => Some(SearchKind::from_str_ci(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid search type '{}'. Expected: question, user, answer, tag",
                raw
            ))
        })?),
        None => None,
    };

    let (kinds, limit): (Vec<SearchKind>, u64) = match filter {
        Some(kind) => (vec![kind], FILTERED_LIMIT),
        None => (SearchKind::all().to_vec(), UNFILTERED_LIMIT),
    };

    let mut results = Vec::new();
    for kind in kinds {
        match kind {
            SearchKind::Question => {
                for question in questions.search_by_title(query, limit).await? {
                    results.push(SearchResult {
                        title: question.title,
                        kind,
                        id: question.id,
                    });
                }
            }
            SearchKind::User => {
                for user in users.search_by_name(query, limit).await? {
                    // Profile pages are addressed by the external auth id.
                    results.push(SearchResult {
                        title: user.name,
                        kind,
                        id: user.auth_id,
                    });
                }
            }
            SearchKind::Answer => {
                for answer in answers.search_by_content(query, limit).await? {
                    // Answers have no page of their own; point at the
                    // parent question and synthesize a title.
                    results.push(SearchResult {
                        title: format!("Answers containing {}", query),
                        kind,
                        id: answer.question,
                    });
                }
            }
            SearchKind::Tag => {
                for tag in tags.search_by_name(query, limit).await? {
                    results.push(SearchResult {
                        title: tag.name,
                        kind,
                        id: tag.id,
                    });
                }
            }
        }
    }

    Ok(results)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Axum handler for `GET /api/v1/search`.
pub async fn search_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Query(params): axum::extract::Query<SearchParams>,
) -> Result<axum::Json<Vec<SearchResult>>, AppError> {
    let results = process_global_search(
        state.questions.as_ref(),
        state.users.as_ref(),
        state.answers.as_ref(),
        state.tags.as_ref(),
        &params.q,
        params.kind.as_deref(),
    )
    .await?;

    Ok(axum::Json(results))
}
