use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::content::sanitize_html;
use crate::db::answer_repository::AnswerRepository;
use crate::db::interaction_repository::InteractionRepository;
use crate::db::models::{Answer, Interaction, InteractionAction};
use crate::db::question_repository::QuestionRepository;
use crate::error::AppError;
use crate::revalidate::Revalidator;

const ANSWER_MIN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerRequest {
    /// Rich-text HTML body; sanitized before storage.
    pub content: String,
    /// Internal id of the answering user.
    pub author: String,
    /// Id of the question being answered.
    pub question: String,
    /// Page to revalidate once the answer exists.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerResponse {
    pub message: String,
    pub id: String,
}

/// Post an answer to a question and log the interaction.
pub async fn process_create_answer(
    answers: &dyn AnswerRepository,
    questions: &dyn QuestionRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    request: CreateAnswerRequest,
) -> Result<CreateAnswerResponse, AppError> {
    if request.content.chars().count() < ANSWER_MIN {
        return Err(AppError::Validation(format!(
            "Answer must be at least {} characters",
            ANSWER_MIN
        )));
    }

    let question = questions
        .find_by_id(&request.question)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", request.question)))?;

    let answer = Answer {
        id: uuid::Uuid::new_v4().to_string(),
        author: request.author.clone(),
        question: question.id.clone(),
        content: sanitize_html(&request.content),
        upvotes: Vec::new(),
        downvotes: Vec::new(),
        created_at: Utc::now(),
    };
    let answer_id = answer.id.clone();

    answers.insert(answer).await?;
    questions.add_answer(&question.id, &answer_id).await?;

    interactions
        .insert(Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            user: request.author.clone(),
            action: InteractionAction::Answer,
            question: Some(question.id.clone()),
            answer: Some(answer_id.clone()),
            tags: question.tags.clone(),
            created_at: Utc::now(),
        })
        .await?;

    revalidator.revalidate(&request.path);

    Ok(CreateAnswerResponse {
        message: "Answer posted".to_string(),
        id: answer_id,
    })
}

/// All answers to a question, newest first.
pub async fn process_list_answers(
    answers: &dyn AnswerRepository,
    question_id: &str,
) -> Result<Vec<Answer>, AppError> {
    answers.find_by_question(question_id).await
}

/// Delete an answer: remove it, strip it from its question, drop its
/// interactions. Same non-transactional cascade caveats as question
/// deletion, except an unknown answer id is an error here because the
/// question back-reference cannot be resolved without the record.
pub async fn process_delete_answer(
    answers: &dyn AnswerRepository,
    questions: &dyn QuestionRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    id: &str,
    path: &str,
) -> Result<(), AppError> {
    let answer = answers
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Answer '{}' not found", id)))?;

    answers.delete(id).await?;
    questions.pull_answer(&answer.question, id).await?;
    interactions.delete_by_answer(id).await?;

    revalidator.revalidate(path);
    Ok(())
}

// -- Axum handlers --

pub async fn create_answer_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::Json(request): axum::Json<CreateAnswerRequest>,
) -> Result<axum::Json<CreateAnswerResponse>, AppError> {
    let response = process_create_answer(
        state.answers.as_ref(),
        state.questions.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        request,
    )
    .await?;

    Ok(axum::Json(response))
}

pub async fn list_answers_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(question_id): axum::extract::Path<String>,
) -> Result<axum::Json<Vec<Answer>>, AppError> {
    let answers = process_list_answers(state.answers.as_ref(), &question_id).await?;
    Ok(axum::Json(answers))
}

pub async fn delete_answer_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::extract::Query(params): axum::extract::Query<super::questions::DeleteParams>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    process_delete_answer(
        state.answers.as_ref(),
        state.questions.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        &id,
        params.path.as_deref().unwrap_or("/"),
    )
    .await?;
    Ok(axum::Json(serde_json::json!({ "message": "Answer deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{
        InMemoryAnswerRepository, InMemoryInteractionRepository, InMemoryQuestionRepository,
    };
    use crate::db::models::Question;
    use crate::revalidate::RecordingRevalidator;

    fn make_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            title: "How do lifetimes work?".to_string(),
            content: "<p>Long enough body.</p>".to_string(),
            tags: vec!["t-rust".to_string()],
            views: 0,
            upvotes: vec![],
            downvotes: vec![],
            author: "u-asker".to_string(),
            answers: vec![],
            created_at: Utc::now(),
        }
    }

    fn long_answer() -> String {
        "An answer with enough substance to clear the minimum length check for answers. "
            .repeat(2)
    }

    struct Env {
        answers: InMemoryAnswerRepository,
        questions: InMemoryQuestionRepository,
        interactions: InMemoryInteractionRepository,
        revalidator: RecordingRevalidator,
    }

    async fn env() -> Env {
        let env = Env {
            answers: InMemoryAnswerRepository::new(),
            questions: InMemoryQuestionRepository::new(),
            interactions: InMemoryInteractionRepository::new(),
            revalidator: RecordingRevalidator::new(),
        };
        env.questions.insert(make_question("q-1")).await.unwrap();
        env
    }

    fn request(question: &str) -> CreateAnswerRequest {
        CreateAnswerRequest {
            content: long_answer(),
            author: "u-answerer".to_string(),
            question: question.to_string(),
            path: "/question/q-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_answer_links_question() {
        let env = env().await;

        let response = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            request("q-1"),
        )
        .await
        .unwrap();

        let question = env.questions.find_by_id("q-1").await.unwrap().unwrap();
        assert_eq!(question.answers, vec![response.id.clone()]);

        // The interaction inherits the question's tags.
        let history = env.interactions.find_by_user("u-answerer").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, InteractionAction::Answer);
        assert_eq!(history[0].tags, vec!["t-rust".to_string()]);
    }

    #[tokio::test]
    async fn test_create_answer_unknown_question() {
        let env = env().await;
        let result = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            request("q-missing"),
        )
        .await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_answer_too_short() {
        let env = env().await;
        let mut req = request("q-1");
        req.content = "Too short.".to_string();
        let result = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            req,
        )
        .await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_answers_newest_first() {
        let env = env().await;

        let first = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            request("q-1"),
        )
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            request("q-1"),
        )
        .await
        .unwrap();

        let listed = process_list_answers(&env.answers, "q-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_answer_cascades() {
        let env = env().await;
        let response = process_create_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            request("q-1"),
        )
        .await
        .unwrap();

        process_delete_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            &response.id,
            "/",
        )
        .await
        .unwrap();

        assert!(env.answers.find_by_id(&response.id).await.unwrap().is_none());
        let question = env.questions.find_by_id("q-1").await.unwrap().unwrap();
        assert!(question.answers.is_empty());
        assert_eq!(env.interactions.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_answer_is_not_found() {
        let env = env().await;
        let result = process_delete_answer(
            &env.answers,
            &env.questions,
            &env.interactions,
            &env.revalidator,
            "a-missing",
            "/",
        )
        .await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
