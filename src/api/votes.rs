use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::answer_repository::AnswerRepository;
use crate::db::interaction_repository::InteractionRepository;
use crate::db::models::{Interaction, InteractionAction, VoteSide, VoteUpdate};
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::revalidate::Revalidator;

/// Reputation granted to a voter for casting a vote (refunded on revoke).
const VOTER_DELTA: i64 = 1;
/// Reputation the target's author gains per upvote / loses per downvote.
const AUTHOR_DELTA: i64 = 10;

/// The direction of a vote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

/// A vote request as the UI sends it: the acting user, the direction, the
/// user's current vote state on the target, and the page to revalidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub user_id: String,
    pub kind: VoteKind,
    #[serde(default)]
    pub has_upvoted: bool,
    #[serde(default)]
    pub has_downvoted: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub message: String,
}

/// The computed effect of one vote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEffect {
    /// Set mutation to apply to the target document.
    pub update: VoteUpdate,
    /// Reputation change for the voting user.
    pub voter_delta: i64,
    /// Reputation change for the target's author.
    pub author_delta: i64,
    /// Whether a new vote was cast (false when a vote was only revoked).
    pub casts_vote: bool,
}

/// Resolve a vote action against the user's current state.
///
/// Toggle table (upvote case; the downvote case is symmetric):
/// already upvoted → revoke it; already downvoted → switch sides;
/// neither → cast. Casting adds reputation, revoking subtracts it; a side
/// switch is a revoke and a cast in one step, so the voter comes out even
/// while the author swings by twice the per-vote value.
pub fn compute_vote_effect(
    kind: VoteKind,
    has_upvoted: bool,
    has_downvoted: bool,
    user_id: &str,
) -> VoteEffect {
    let (own_side, other_side, author_sign) = match kind {
        VoteKind::Up => (VoteSide::Up, VoteSide::Down, 1),
        VoteKind::Down => (VoteSide::Down, VoteSide::Up, -1),
    };
    let already_own = match kind {
        VoteKind::Up => has_upvoted,
        VoteKind::Down => has_downvoted,
    };
    let already_other = match kind {
        VoteKind::Up => has_downvoted,
        VoteKind::Down => has_upvoted,
    };

    if already_own {
        // Toggle off: revoke the existing vote.
        VoteEffect {
            update: VoteUpdate {
                user_id: user_id.to_string(),
                add: None,
                remove: Some(own_side),
            },
            voter_delta: -VOTER_DELTA,
            author_delta: -author_sign * AUTHOR_DELTA,
            casts_vote: false,
        }
    } else if already_other {
        // Switch sides: pull the opposite vote, add this one.
        VoteEffect {
            update: VoteUpdate {
                user_id: user_id.to_string(),
                add: Some(own_side),
                remove: Some(other_side),
            },
            voter_delta: 0,
            author_delta: 2 * author_sign * AUTHOR_DELTA,
            casts_vote: true,
        }
    } else {
        VoteEffect {
            update: VoteUpdate {
                user_id: user_id.to_string(),
                add: Some(own_side),
                remove: None,
            },
            voter_delta: VOTER_DELTA,
            author_delta: author_sign * AUTHOR_DELTA,
            casts_vote: true,
        }
    }
}

fn interaction_action(kind: VoteKind) -> InteractionAction {
    match kind {
        VoteKind::Up => InteractionAction::Upvote,
        VoteKind::Down => InteractionAction::Downvote,
    }
}

async fn apply_reputation(
    users: &dyn UserRepository,
    user_id: &str,
    delta: i64,
) -> Result<(), AppError> {
    if delta == 0 {
        return Ok(());
    }
    if !users.adjust_reputation(user_id, delta).await? {
        tracing::warn!("reputation change for unknown user {}", user_id);
    }
    Ok(())
}

/// Toggle a vote on a question and settle both reputations.
pub async fn process_question_vote(
    questions: &dyn QuestionRepository,
    users: &dyn UserRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    question_id: &str,
    request: VoteRequest,
) -> Result<VoteResponse, AppError> {
    let effect = compute_vote_effect(
        request.kind,
        request.has_upvoted,
        request.has_downvoted,
        &request.user_id,
    );

    let question = questions
        .apply_vote(question_id, &effect.update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

    apply_reputation(users, &request.user_id, effect.voter_delta).await?;
    apply_reputation(users, &question.author, effect.author_delta).await?;

    if effect.casts_vote {
        interactions
            .insert(Interaction {
                id: uuid::Uuid::new_v4().to_string(),
                user: request.user_id.clone(),
                action: interaction_action(request.kind),
                question: Some(question.id.clone()),
                answer: None,
                tags: question.tags.clone(),
                created_at: Utc::now(),
            })
            .await?;
    }

    revalidator.revalidate(&request.path);

    Ok(VoteResponse {
        message: "Vote recorded".to_string(),
    })
}

/// Toggle a vote on an answer and settle both reputations.
pub async fn process_answer_vote(
    answers: &dyn AnswerRepository,
    users: &dyn UserRepository,
    interactions: &dyn InteractionRepository,
    revalidator: &dyn Revalidator,
    answer_id: &str,
    request: VoteRequest,
) -> Result<VoteResponse, AppError> {
    let effect = compute_vote_effect(
        request.kind,
        request.has_upvoted,
        request.has_downvoted,
        &request.user_id,
    );

    let answer = answers
        .apply_vote(answer_id, &effect.update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Answer '{}' not found", answer_id)))?;

    apply_reputation(users, &request.user_id, effect.voter_delta).await?;
    apply_reputation(users, &answer.author, effect.author_delta).await?;

    if effect.casts_vote {
        interactions
            .insert(Interaction {
                id: uuid::Uuid::new_v4().to_string(),
                user: request.user_id.clone(),
                action: interaction_action(request.kind),
                question: Some(answer.question.clone()),
                answer: Some(answer.id.clone()),
                tags: Vec::new(),
                created_at: Utc::now(),
            })
            .await?;
    }

    revalidator.revalidate(&request.path);

    Ok(VoteResponse {
        message: "Vote recorded".to_string(),
    })
}

/// Axum handler for `POST /api/v1/questions/{id}/vote`.
pub async fn question_vote_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<VoteRequest>,
) -> Result<axum::Json<VoteResponse>, AppError> {
    let response = process_question_vote(
        state.questions.as_ref(),
        state.users.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        &id,
        request,
    )
    .await?;

    Ok(axum::Json(response))
}

/// Axum handler for `POST /api/v1/answers/{id}/vote`.
pub async fn answer_vote_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
    axum::Json(request): axum::Json<VoteRequest>,
) -> Result<axum::Json<VoteResponse>, AppError> {
    let response = process_answer_vote(
        state.answers.as_ref(),
        state.users.as_ref(),
        state.interactions.as_ref(),
        state.revalidator.as_ref(),
        &id,
        request,
    )
    .await?;

    Ok(axum::Json(response))
}
