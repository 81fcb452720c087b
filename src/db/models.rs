use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A community member, stored in the `users` collection.
///
/// Authentication is delegated to a third-party identity provider; the only
/// trace of it here is `auth_id`, the provider-issued identifier that profile
/// pages are keyed by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal id (UUIDv4 string).
    pub id: String,
    /// External identity provider id (unique).
    pub auth_id: String,
    /// Display name.
    pub name: String,
    /// Unique handle.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Short profile bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Avatar URL.
    pub picture: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub portfolio_website: Option<String>,
    /// Reputation score. Mutated only by vote and ask-question side effects.
    #[serde(default)]
    pub reputation: i64,
    /// Ids of questions the user has saved to their collection.
    #[serde(default)]
    pub saved: Vec<String>,
    /// Timestamp of account creation.
    pub joined_at: DateTime<Utc>,
}

/// A question, stored in the `questions` collection.
///
/// `upvotes` and `downvotes` hold user ids; toggle semantics keep a given
/// user in at most one of the two sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Internal id (UUIDv4 string).
    pub id: String,
    pub title: String,
    /// Sanitized rich-text HTML body.
    pub content: String,
    /// Tag ids (1–3, fixed at creation).
    pub tags: Vec<String>,
    /// View counter, only ever incremented.
    #[serde(default)]
    pub views: u64,
    /// Ids of users who upvoted.
    #[serde(default)]
    pub upvotes: Vec<String>,
    /// Ids of users who downvoted.
    #[serde(default)]
    pub downvotes: Vec<String>,
    /// Id of the asking user.
    pub author: String,
    /// Ids of answers posted to this question.
    #[serde(default)]
    pub answers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// An answer to a question, stored in the `answers` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Internal id (UUIDv4 string).
    pub id: String,
    /// Id of the answering user.
    pub author: String,
    /// Id of the question this answers.
    pub question: String,
    /// Sanitized rich-text HTML body.
    pub content: String,
    #[serde(default)]
    pub upvotes: Vec<String>,
    #[serde(default)]
    pub downvotes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A tag, stored in the `tags` collection. Names are unique; lookups are
/// case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Internal id (UUIDv4 string).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Back-references to questions carrying this tag.
    #[serde(default)]
    pub questions: Vec<String>,
    /// Ids of users following the tag.
    #[serde(default)]
    pub followers: Vec<String>,
    pub created_on: DateTime<Utc>,
}

/// The kind of user action an [`Interaction`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    View,
    AskQuestion,
    Answer,
    Upvote,
    Downvote,
}

/// An append-only log record of a user action, stored in the `interactions`
/// collection. Never mutated; removed only when its subject question or
/// answer is deleted. The recommendation engine and the tag affinity
/// aggregator are built on this log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Internal id (UUIDv4 string).
    pub id: String,
    /// Id of the acting user.
    pub user: String,
    pub action: InteractionAction,
    /// Question the action touched, if any.
    #[serde(default)]
    pub question: Option<String>,
    /// Answer the action touched, if any.
    #[serde(default)]
    pub answer: Option<String>,
    /// Tag ids of the subject at the time of the action.
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Which of the two vote sets a mutation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteSide {
    Up,
    Down,
}

/// A computed vote-set mutation, applied to a question or answer as a single
/// atomic document update. At most one side gains the user and at most one
/// side loses them, which is how the mutual-exclusion invariant between
/// `upvotes` and `downvotes` is maintained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteUpdate {
    /// Id of the voting user.
    pub user_id: String,
    /// Side the user is added to (`$addToSet`), if any.
    pub add: Option<VoteSide>,
    /// Side the user is removed from (`$pull`), if any.
    pub remove: Option<VoteSide>,
}
