use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::interaction_repository::InteractionRepository;
use crate::db::models::{Interaction, InteractionAction};
use crate::db::question_repository::QuestionRepository;
use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewQuestionRequest {
    /// The viewing user, when signed in. Anonymous views still count.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Count a question view. The counter always moves; a `View` interaction is
/// logged at most once per user and question, so repeat visits don't skew
/// the viewer's tag affinity.
pub async fn process_view_question(
    questions: &dyn QuestionRepository,
    interactions: &dyn InteractionRepository,
    question_id: &str,
    request: ViewQuestionRequest,
) -> Result<(), AppError> {
    let question = questions
        .find_by_id(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

    questions.increment_views(question_id).await?;

    if let Some(user_id) = request.user_id {
        if interactions.has_viewed(&user_id, question_id).await? {
            tracing::debug!("user {} already viewed question {}", user_id, question_id);
            return Ok(());
        }

        interactions
            .insert(Interaction {
                id: uuid::Uuid::new_v4().to_string(),
                user: user_id,
                action: InteractionAction::View,
                question: Some(question.id.clone()),
                answer: None,
                tags: question.tags,
                created_at: Utc::now(),
            })
            .await?;
    }

    Ok(())
}

/// Axum handler for `POST /api/v1/questions/{id}/view`.
pub async fn view_question_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<ViewQuestionRequest>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    process_view_question(
        state.questions.as_ref(),
        state.interactions.as_ref(),
        &id,
        request,
    )
    .await?;
    Ok(axum::Json(serde_json::json!({ "message": "View recorded" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{InMemoryInteractionRepository, InMemoryQuestionRepository};
    use crate::db::models::Question;

    fn make_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            title: "How do lifetimes work?".to_string(),
            content: "<p>Body.</p>".to_string(),
            tags: vec!["t-rust".to_string()],
            views: 0,
            upvotes: vec![],
            downvotes: vec![],
            author: "u-1".to_string(),
            answers: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_view_increments_and_logs_once() {
        let questions = InMemoryQuestionRepository::new();
        let interactions = InMemoryInteractionRepository::new();
        questions.insert(make_question("q-1")).await.unwrap();

        for _ in 0..3 {
            process_view_question(
                &questions,
                &interactions,
                "q-1",
                ViewQuestionRequest {
                    user_id: Some("u-2".to_string()),
                },
            )
            .await
            .unwrap();
        }

        let question = questions.find_by_id("q-1").await.unwrap().unwrap();
        assert_eq!(question.views, 3);

        // Only the first view landed in the interaction log.
        let history = interactions.find_by_user("u-2").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, InteractionAction::View);
        assert_eq!(history[0].tags, vec!["t-rust".to_string()]);
    }

    #[tokio::test]
    async fn test_anonymous_view_only_counts() {
        let questions = InMemoryQuestionRepository::new();
        let interactions = InMemoryInteractionRepository::new();
        questions.insert(make_question("q-1")).await.unwrap();

        process_view_question(
            &questions,
            &interactions,
            "q-1",
            ViewQuestionRequest::default(),
        )
        .await
        .unwrap();

        let question = questions.find_by_id("q-1").await.unwrap().unwrap();
        assert_eq!(question.views, 1);
        assert!(interactions.is_empty());
    }

    #[tokio::test]
    async fn test_view_unknown_question() {
        let questions = InMemoryQuestionRepository::new();
        let interactions = InMemoryInteractionRepository::new();

        let result = process_view_question(
            &questions,
            &interactions,
            "q-missing",
            ViewQuestionRequest::default(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
