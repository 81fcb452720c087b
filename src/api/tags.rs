use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::interaction_repository::InteractionRepository;
use crate::db::models::{Interaction, Question, Tag};
use crate::db::question_repository::QuestionRepository;
use crate::db::tag_repository::{PopularTag, TagRepository};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::page::{PageRequest, Paged};

/// Default page size for the tags directory.
const TAGS_PAGE_SIZE: u64 = 20;
/// Default page size for a single tag's question listing.
const TAG_QUESTIONS_PAGE_SIZE: u64 = 10;
/// How many tags the "popular" sidebar shows.
const POPULAR_TAGS_LIMIT: u64 = 5;
/// Default number of affinity tags reported per user.
const TOP_TAGS_LIMIT: u64 = 3;

#[derive(Debug, Default, Deserialize)]
pub struct ListTagsParams {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// The tags directory, alphabetical, optionally filtered by name.
pub async fn process_list_tags(
    tags: &dyn TagRepository,
    params: ListTagsParams,
) -> Result<Paged<Tag>, AppError> {
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };
    let skip = page.skip(TAGS_PAGE_SIZE);

    let (items, total) = tags
        .list(params.q.as_deref(), skip, page.size(TAGS_PAGE_SIZE))
        .await?;

    Ok(Paged::new(items, total, skip))
}

/// Tags ranked by how many questions carry them.
pub async fn process_popular_tags(tags: &dyn TagRepository) -> Result<Vec<PopularTag>, AppError> {
    tags.find_popular(POPULAR_TAGS_LIMIT).await
}

#[derive(Debug, Default, Deserialize)]
pub struct TagQuestionsParams {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagQuestionsResponse {
    pub tag_name: String,
    pub questions: Paged<Question>,
}

/// A tag's questions, newest first.
pub async fn process_questions_by_tag(
    tags: &dyn TagRepository,
    questions: &dyn QuestionRepository,
    tag_id: &str,
    params: TagQuestionsParams,
) -> Result<TagQuestionsResponse, AppError> {
    let tag = tags
        .find_by_id(tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag '{}' not found", tag_id)))?;

    let page = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };
    let skip = page.skip(TAG_QUESTIONS_PAGE_SIZE);

    let (items, total) = questions
        .find_by_tag(
            &tag.id,
            params.q.as_deref(),
            skip,
            page.size(TAG_QUESTIONS_PAGE_SIZE),
        )
        .await?;

    Ok(TagQuestionsResponse {
        tag_name: tag.name,
        questions: Paged::new(items, total, skip),
    })
}

/// One entry of a user's tag affinity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAffinity {
    pub id: String,
    pub name: String,
    pub count: u64,
}

/// Rank tag ids by how often they appear across a user's interactions.
/// Ties break by tag id so the ranking is deterministic.
pub fn rank_tag_affinity(history: &[Interaction], limit: u64) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for interaction in history {
        for tag_id in &interaction.tags {
            *counts.entry(tag_id.as_str()).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit as usize);
    ranked
}

#[derive(Debug, Default, Deserialize)]
pub struct TopTagsParams {
    pub limit: Option<u64>,
}

/// A user's most interacted-with tags, with display names resolved.
pub async fn process_top_interacted_tags(
    users: &dyn UserRepository,
    interactions: &dyn InteractionRepository,
    tags: &dyn TagRepository,
    auth_id: &str,
    params: TopTagsParams,
) -> Result<Vec<TagAffinity>, AppError> {
    let user = users
        .find_by_auth_id(auth_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", auth_id)))?;

    let history = interactions.find_by_user(&user.id).await?;
    let ranked = rank_tag_affinity(&history, params.limit.unwrap_or(TOP_TAGS_LIMIT));

    let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
    let tag_docs = tags.find_by_ids(&ids).await?;

    // Join counts to names, keeping rank order. A tag that disappeared
    // between the log and now is simply skipped.
    let affinity = ranked
        .into_iter()
        .filter_map(|(id, count)| {
            tag_docs.iter().find(|t| t.id == id).map(|t| TagAffinity {
                id,
                name: t.name.clone(),
                count,
            })
        })
        .collect();

    Ok(affinity)
}

// -- Axum handlers --

pub async fn list_tags_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Query(params): axum::extract::Query<ListTagsParams>,
) -> Result<axum::Json<Paged<Tag>>, AppError> {
    let page = process_list_tags(state.tags.as_ref(), params).await?;
    Ok(axum::Json(page))
}

pub async fn popular_tags_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
) -> Result<axum::Json<Vec<PopularTag>>, AppError> {
    let tags = process_popular_tags(state.tags.as_ref()).await?;
    Ok(axum::Json(tags))
}

pub async fn tag_questions_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(tag_id): axum::extract::Path<String>,
    axum::extract::Query(params): axum::extract::Query<TagQuestionsParams>,
) -> Result<axum::Json<TagQuestionsResponse>, AppError> {
    let response = process_questions_by_tag(
        state.tags.as_ref(),
        state.questions.as_ref(),
        &tag_id,
        params,
    )
    .await?;
    Ok(axum::Json(response))
}

pub async fn top_tags_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(auth_id): axum::extract::Path<String>,
    axum::extract::Query(params): axum::extract::Query<TopTagsParams>,
) -> Result<axum::Json<Vec<TagAffinity>>, AppError> {
    let affinity = process_top_interacted_tags(
        state.users.as_ref(),
        state.interactions.as_ref(),
        state.tags.as_ref(),
        &auth_id,
        params,
    )
    .await?;
    Ok(axum::Json(affinity))
}
