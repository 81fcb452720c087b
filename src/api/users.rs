use serde::{Deserialize, Serialize};

use crate::db::models::{Question, User};
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::page::{PageRequest, Paged};
use crate::revalidate::Revalidator;

/// Default page size for the community directory and saved collections.
const USERS_PAGE_SIZE: u64 = 20;
const SAVED_PAGE_SIZE: u64 = 20;

/// Fetch a user by their external auth id.
pub async fn process_get_user(
    users: &dyn UserRepository,
    auth_id: &str,
) -> Result<User, AppError> {
    users
        .find_by_auth_id(auth_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", auth_id)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// The community directory, newest members first.
pub async fn process_list_users(
    users: &dyn UserRepository,
    params: ListUsersParams,
) -> Result<Paged<User>, AppError> {
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };
    let skip = page.skip(USERS_PAGE_SIZE);

    let (items, total) = users
        .list(params.q.as_deref(), skip, page.size(USERS_PAGE_SIZE))
        .await?;

    Ok(Paged::new(items, total, skip))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleSaveRequest {
    pub question_id: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleSaveResponse {
    /// Whether the question is saved after the toggle.
    pub saved: bool,
}

/// Save a question to the user's collection, or remove it if it is already
/// there.
pub async fn process_toggle_save(
    users: &dyn UserRepository,
    questions: &dyn QuestionRepository,
    revalidator: &dyn Revalidator,
    auth_id: &str,
    request: ToggleSaveRequest,
) -> Result<ToggleSaveResponse, AppError> {
    let user = users
        .find_by_auth_id(auth_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", auth_id)))?;

    questions
        .find_by_id(&request.question_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Question '{}' not found", request.question_id))
        })?;

    let already_saved = user.saved.iter().any(|q| q == &request.question_id);
    if already_saved {
        users.unsave_question(&user.id, &request.question_id).await?;
    } else {
        users.save_question(&user.id, &request.question_id).await?;
    }

    revalidator.revalidate(&request.path);

    Ok(ToggleSaveResponse {
        saved: !already_saved,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SavedQuestionsParams {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// The user's saved questions, newest first.
pub async fn process_saved_questions(
    users: &dyn UserRepository,
    questions: &dyn QuestionRepository,
    auth_id: &str,
    params: SavedQuestionsParams,
) -> Result<Paged<Question>, AppError> {
    let user = users
        .find_by_auth_id(auth_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", auth_id)))?;

    if user.saved.is_empty() {
        return Ok(Paged::empty());
    }

    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };
    let skip = page.skip(SAVED_PAGE_SIZE);

    let (items, total) = questions
        .find_saved(
            &user.saved,
            params.q.as_deref(),
            skip,
            page.size(SAVED_PAGE_SIZE),
        )
        .await?;

    Ok(Paged::new(items, total, skip))
}

// -- Axum handlers --

pub async fn get_user_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(auth_id): axum::extract::Path<String>,
) -> Result<axum::Json<User>, AppError> {
    let user = process_get_user(state.users.as_ref(), &auth_id).await?;
    Ok(axum::Json(user))
}

pub async fn list_users_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Query(params): axum::extract::Query<ListUsersParams>,
) -> Result<axum::Json<Paged<User>>, AppError> {
    let page = process_list_users(state.users.as_ref(), params).await?;
    Ok(axum::Json(page))
}

pub async fn toggle_save_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(auth_id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<ToggleSaveRequest>,
) -> Result<axum::Json<ToggleSaveResponse>, AppError> {
    let response = process_toggle_save(
        state.users.as_ref(),
        state.questions.as_ref(),
        state.revalidator.as_ref(),
        &auth_id,
        request,
    )
    .await?;
    Ok(axum::Json(response))
}

pub async fn saved_questions_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(auth_id): axum::extract::Path<String>,
    axum::extract::Query(params): axum::extract::Query<SavedQuestionsParams>,
) -> Result<axum::Json<Paged<Question>>, AppError> {
    let page = process_saved_questions(
        state.users.as_ref(),
        state.questions.as_ref(),
        &auth_id,
        params,
    )
    .await?;
    Ok(axum::Json(page))
}
