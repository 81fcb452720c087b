use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::content::sanitize_html;
use crate::db::answer_repository::AnswerRepository;
use crate::db::interaction_repository::InteractionRepository;
use crate::db::list_query::{QuestionListFilter, QuestionListQuery};
use crate::db::models::{Interaction, InteractionAction, Question};
use crate::db::question_repository::QuestionRepository;
use crate::db::tag_repository::TagRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::page::{PageRequest, Paged};
use crate::revalidate::Revalidator;

/// Default page size for question listings.
pub const QUESTIONS_PAGE_SIZE: u64 = 20;
/// How many questions the "hot" sidebar shows.
const HOT_QUESTIONS_LIMIT: u64 = 5;
/// Reputation granted for asking a question.
const ASK_REPUTATION: i64 = 5;

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 130;
const CONTENT_MIN: usize = 100;
const TAGS_MAX: usize = 3;
const TAG_LEN_MAX: usize = 15;

/// Validate title/content/tags against the form constraints the UI also
/// enforces. Tags are only checked on create; they are immutable afterwards.
fn validate_question(title: &str, content: &str, tags: Option<&[String]>) -> Result<(), AppError> {
    let title_len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&title_len) {
        return Err(AppError::Validation(format!(
            "Title must be between {} and {} characters",
            TITLE_MIN, TITLE_MAX
        )));
    }
    if content.chars().count() < CONTENT_MIN {
        return Err(AppError::Validation(format!(
            "Question body must be at least {} characters",
            CONTENT_MIN
        )));
    }
    if let Some(tags) = tags {
        if tags.is_empty() || tags.len() > TAGS_MAX {
            return Err(AppError::Validation(format!(
                "Between 1 and {} tags are required",
                TAGS_MAX
            )));
        }
        for tag in tags {
            let len = tag.chars().count();
            if len == 0 || len > TAG_LEN_MAX {
                return Err(AppError::Validation(format!(
                    "Tags must be between 1 and {} characters",
                    TAG_LEN_MAX
                )));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsParams {
    /// Case-insensitive substring matched against title and content.
    pub q: Option<String>,
    /// One of `newest`, `frequent`, `unanswered`.
    pub filter: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Home-page question listing.
pub async fn process_list_questions(
    questions: &dyn QuestionRepository,
    params: ListQuestionsParams,
) -> Result<Paged<Question>, AppError> {
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };

    let query = QuestionListQuery {
        search: params.q,
        filter: params.filter.as_deref().and_then(QuestionListFilter::from_str_ci),
        skip: page.skip(QUESTIONS_PAGE_SIZE),
        limit: page.size(QUESTIONS_PAGE_SIZE),
    };

    let (items, total) = questions.list(&query).await?;
    Ok(Paged::new(items, total, query.skip))
}

/// Fetch one question by id.
pub async fn process_get_question(
    questions: &dyn QuestionRepository,
    id: &str,
) -> Result<Question, AppError> {
    questions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", id)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    /// Rich-text HTML body; sanitized before storage.
    pub content: String,
    /// Tag names (1–3); resolved to tag documents case-insensitively.
    pub tags: Vec<String>,
    /// Internal id of the asking user.
    pub author: String,
    /// Page to revalidate once the question exists.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionResponse {
    pub message: String,
    pub id: String,
}

/// Create a question: upsert its tags, log the interaction, reward the
/// author, signal the cache.
pub async fn process_create_question(
    questions: &dyn QuestionRepository,
    tags: &dyn TagRepository,
    users: &dyn UserRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    request: CreateQuestionRequest,
) -> Result<CreateQuestionResponse, AppError> {
    validate_question(&request.title, &request.content, Some(&request.tags))?;

    let author = users
        .find_by_id(&request.author)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", request.author)))?;

    let question_id = uuid::Uuid::new_v4().to_string();

    // Resolve tag names to documents, creating missing ones. Each upsert
    // also records the question against the tag.
    let mut tag_ids = Vec::with_capacity(request.tags.len());
    for name in &request.tags {
        let tag = tags.upsert_for_question(name, &question_id).await?;
        if !tag_ids.contains(&tag.id) {
            tag_ids.push(tag.id);
        }
    }

    let question = Question {
        id: question_id.clone(),
        title: request.title.clone(),
        content: sanitize_html(&request.content),
        tags: tag_ids.clone(),
        views: 0,
        upvotes: Vec::new(),
        downvotes: Vec::new(),
        author: author.id.clone(),
        answers: Vec::new(),
        created_at: Utc::now(),
    };
    questions.insert(question).await?;

    interactions
        .insert(Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            user: author.id.clone(),
            action: InteractionAction::AskQuestion,
            question: Some(question_id.clone()),
            answer: None,
            tags: tag_ids,
            created_at: Utc::now(),
        })
        .await?;

    users.adjust_reputation(&author.id, ASK_REPUTATION).await?;

    revalidator.revalidate(&request.path);

    Ok(CreateQuestionResponse {
        message: "Question created".to_string(),
        id: question_id,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditQuestionRequest {
    pub title: String,
    pub content: String,
    pub path: String,
}

/// Edit a question's title and content. Tags cannot be changed after
/// creation.
pub async fn process_edit_question(
    questions: &dyn QuestionRepository,
    revalidator: &dyn Revalidator,
    id: &str,
    request: EditQuestionRequest,
) -> Result<(), AppError> {
    validate_question(&request.title, &request.content, None)?;

    let content = sanitize_html(&request.content);
    if !questions.update_content(id, &request.title, &content).await? {
        return Err(AppError::NotFound(format!("Question '{}' not found", id)));
    }

    revalidator.revalidate(&request.path);
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub path: Option<String>,
}

/// Delete a question and everything hanging off it: its answers, the
/// interactions referencing it, and the back-references in tag documents.
///
/// The cascade issues several independent deletes with no transaction; a
/// crash part-way leaves orphans until the next delete of the same id, which
/// is a harmless no-op for the steps that already ran. Deleting an unknown
/// id is itself a no-op.
pub async fn process_delete_question(
    questions: &dyn QuestionRepository,
    answers: &dyn AnswerRepository,
    tags: &dyn TagRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    id: &str,
    path: &str,
) -> Result<(), AppError> {
    questions.delete(id).await?;
    let removed_answers = answers.delete_by_question(id).await?;
    let removed_interactions = interactions.delete_by_question(id).await?;
    let touched_tags = tags.pull_question(id).await?;

    tracing::debug!(
        "deleted question {}: {} answers, {} interactions, {} tag references",
        id,
        removed_answers,
        removed_interactions,
        touched_tags
    );

    revalidator.revalidate(path);
    Ok(())
}

/// The most viewed, most upvoted questions.
pub async fn process_hot_questions(
    questions: &dyn QuestionRepository,
) -> Result<Vec<Question>, AppError> {
    questions.find_hot(HOT_QUESTIONS_LIMIT).await
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendedParams {
    /// External auth id of the user to recommend for.
    pub user_id: String,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Questions matching the user's tag affinity, excluding their own.
///
/// The affinity set is the distinct tags across the user's interaction
/// history; a user with no history gets an empty page, never the
/// unfiltered firehose.
pub async fn process_recommended(
    questions: &dyn QuestionRepository,
    users: &dyn UserRepository,
    interactions: &dyn InteractionRepository,
    params: RecommendedParams,
) -> Result<Paged<Question>, AppError> {
    let user = users
        .find_by_auth_id(&params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", params.user_id)))?;

    let history = interactions.find_by_user(&user.id).await?;
    let mut tag_ids: Vec<String> = history.into_iter().flat_map(|i| i.tags).collect();
    tag_ids.sort();
    tag_ids.dedup();

    if tag_ids.is_empty() {
        return Ok(Paged::empty());
    }

    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };
    let skip = page.skip(QUESTIONS_PAGE_SIZE);

    let (items, total) = questions
        .find_recommended(
            &tag_ids,
            &user.id,
            params.q.as_deref(),
            skip,
            page.size(QUESTIONS_PAGE_SIZE),
        )
        .await?;

    Ok(Paged::new(items, total, skip))
}

// -- Axum handlers --

pub async fn list_questions_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Query(params): axum::extract::Query<ListQuestionsParams>,
) -> Result<axum::Json<Paged<Question>>, AppError> {
    let page = process_list_questions(state.questions.as_ref(), params).await?;
    Ok(axum::Json(page))
}

pub async fn get_question_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Question>, AppError> {
    let question = process_get_question(state.questions.as_ref(), &id).await?;
    Ok(axum::Json(question))
}

pub async fn create_question_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::Json(request): axum::Json<CreateQuestionRequest>,
) -> Result<axum::Json<CreateQuestionResponse>, AppError> {
    let response = process_create_question(
        state.questions.as_ref(),
        state.tags.as_ref(),
        state.users.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        request,
    )
    .await?;

    Ok(axum::Json(response))
}

pub async fn edit_question_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<EditQuestionRequest>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    process_edit_question(state.questions.as_ref(), state.revalidator.as_ref(), &id, request)
        .await?;
    Ok(axum::Json(serde_json::json!({ "message": "Question updated" })))
}

pub async fn delete_question_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::extract::Query(params): axum::extract::Query<DeleteParams>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    process_delete_question(
        state.questions.as_ref(),
        state.answers.as_ref(),
        state.tags.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        &id,
        params.path.as_deref().unwrap_or("/"),
    )
    .await?;
    Ok(axum::Json(serde_json::json!({ "message": "Question deleted" })))
}

pub async fn hot_questions_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
) -> Result<axum::Json<Vec<Question>>, AppError> {
    let questions = process_hot_questions(state.questions.as_ref()).await?;
    Ok(axum::Json(questions))
}

pub async fn recommended_questions_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Query(params): axum::extract::Query<RecommendedParams>,
) -> Result<axum::Json<Paged<Question>>, AppError> {
    let page = process_recommended(
        state.questions.as_ref(),
        state.users.as_ref(),
        state.interactions.as_ref(),
        params,
    )
    .await?;
    Ok(axum::Json(page))
}
