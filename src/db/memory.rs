//! In-memory repository implementations backed by `Mutex<Vec<T>>`.
//!
//! These mirror the MongoDB repositories' contracts exactly and exist so
//! tests (unit and integration) can exercise the full action layer without
//! a database. Substring matching is case-insensitive `contains`, the same
//! semantics the Mongo implementations get from their escaped `$regex`
//! filters.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::answer_repository::AnswerRepository;
use crate::db::interaction_repository::InteractionRepository;
use crate::db::list_query::{QuestionListFilter, QuestionListQuery};
use crate::db::models::{
    Answer, Interaction, InteractionAction, Question, Tag, User, VoteSide, VoteUpdate,
};
use crate::db::question_repository::QuestionRepository;
use crate::db::tag_repository::{PopularTag, TagRepository};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn page<T: Clone>(items: Vec<T>, skip: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page = items
        .into_iter()
        .skip(skip as usize)
        .take(limit as usize)
        .collect();
    (page, total)
}

fn apply_vote_sets(upvotes: &mut Vec<String>, downvotes: &mut Vec<String>, update: &VoteUpdate) {
    if let Some(side) = update.remove {
        let set = match side {
            VoteSide::Up => &mut *upvotes,
            VoteSide::Down => &mut *downvotes,
        };
        set.retain(|id| id != &update.user_id);
    }
    if let Some(side) = update.add {
        let set = match side {
            VoteSide::Up => upvotes,
            VoteSide::Down => downvotes,
        };
        if !set.contains(&update.user_id) {
            set.push(update.user_id.clone());
        }
    }
}

// -- Questions --

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: Mutex<Vec<Question>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn insert(&self, question: Question) -> Result<(), AppError> {
        self.questions.lock().unwrap().push(question);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    async fn list(&self, query: &QuestionListQuery) -> Result<(Vec<Question>, u64), AppError> {
        let mut matched: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| match query.search.as_deref() {
                Some(s) => matches(&q.title, s) || matches(&q.content, s),
                None => true,
            })
            .filter(|q| match query.filter {
                Some(QuestionListFilter::Unanswered) => q.answers.is_empty(),
                _ => true,
            })
            .cloned()
            .collect();

        match query.filter {
            Some(QuestionListFilter::Newest) => {
                matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            Some(QuestionListFilter::Frequent) => {
                matched.sort_by(|a, b| b.views.cmp(&a.views));
            }
            _ => {}
        }

        Ok(page(matched, query.skip, query.limit))
    }

    async fn find_recommended(
        &self,
        tag_ids: &[String],
        exclude_author: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        let matched: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tags.iter().any(|t| tag_ids.contains(t)))
            .filter(|q| q.author != exclude_author)
            .filter(|q| match search {
                Some(s) => matches(&q.title, s) || matches(&q.content, s),
                None => true,
            })
            .cloned()
            .collect();

        Ok(page(matched, skip, limit))
    }

    async fn find_by_tag(
        &self,
        tag_id: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        let mut matched: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tags.iter().any(|t| t == tag_id))
            .filter(|q| match search {
                Some(s) => matches(&q.title, s),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(page(matched, skip, limit))
    }

    async fn find_saved(
        &self,
        ids: &[String],
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        let mut matched: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| ids.contains(&q.id))
            .filter(|q| match search {
                Some(s) => matches(&q.title, s) || matches(&q.content, s),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(page(matched, skip, limit))
    }

    async fn find_hot(&self, limit: u64) -> Result<Vec<Question>, AppError> {
        let mut all: Vec<Question> = self.questions.lock().unwrap().clone();
        all.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then(b.upvotes.len().cmp(&a.upvotes.len()))
        });
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn search_by_title(&self, query: &str, limit: u64) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| matches(&q.title, query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_content(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.title = title.to_string();
                question.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_vote(
        &self,
        id: &str,
        update: &VoteUpdate,
    ) -> Result<Option<Question>, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                apply_vote_sets(&mut question.upvotes, &mut question.downvotes, update);
                Ok(Some(question.clone()))
            }
            None => Ok(None),
        }
    }

    async fn add_answer(&self, id: &str, answer_id: &str) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                if !question.answers.iter().any(|a| a == answer_id) {
                    question.answers.push(answer_id.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_answer(&self, id: &str, answer_id: &str) -> Result<(), AppError> {
        let mut questions = self.questions.lock().unwrap();
        if let Some(question) = questions.iter_mut().find(|q| q.id == id) {
            question.answers.retain(|a| a != answer_id);
        }
        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        let before = questions.len();
        questions.retain(|q| q.id != id);
        Ok(questions.len() < before)
    }
}

// -- Answers --

#[derive(Default)]
pub struct InMemoryAnswerRepository {
    answers: Mutex<Vec<Answer>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn insert(&self, answer: Answer) -> Result<(), AppError> {
        self.answers.lock().unwrap().push(answer);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Answer>, AppError> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_by_question(&self, question_id: &str) -> Result<Vec<Answer>, AppError> {
        let mut matched: Vec<Answer> = self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.question == question_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn search_by_content(&self, query: &str, limit: u64) -> Result<Vec<Answer>, AppError> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| matches(&a.content, query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn apply_vote(
        &self,
        id: &str,
        update: &VoteUpdate,
    ) -> Result<Option<Answer>, AppError> {
        let mut answers = self.answers.lock().unwrap();
        match answers.iter_mut().find(|a| a.id == id) {
            Some(answer) => {
                apply_vote_sets(&mut answer.upvotes, &mut answer.downvotes, update);
                Ok(Some(answer.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut answers = self.answers.lock().unwrap();
        let before = answers.len();
        answers.retain(|a| a.id != id);
        Ok(answers.len() < before)
    }

    async fn delete_by_question(&self, question_id: &str) -> Result<u64, AppError> {
        let mut answers = self.answers.lock().unwrap();
        let before = answers.len();
        answers.retain(|a| a.question != question_id);
        Ok((before - answers.len()) as u64)
    }
}

// -- Users --

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<(), AppError> {
        self.users.lock().unwrap().push(user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.auth_id == auth_id)
            .cloned())
    }

    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64), AppError> {
        let mut matched: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| match search {
                Some(s) => matches(&u.name, s) || matches(&u.username, s),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

        Ok(page(matched, skip, limit))
    }

    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| matches(&u.name, query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn adjust_reputation(&self, id: &str, delta: i64) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.reputation += delta;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_question(&self, id: &str, question_id: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            if !user.saved.iter().any(|q| q == question_id) {
                user.saved.push(question_id.to_string());
            }
        }
        Ok(())
    }

    async fn unsave_question(&self, id: &str, question_id: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.saved.retain(|q| q != question_id);
        }
        Ok(())
    }
}

// -- Tags --

#[derive(Default)]
pub struct InMemoryTagRepository {
    tags: Mutex<Vec<Tag>>,
}

impl InMemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tag>, AppError> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Tag>, AppError> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Tag>, u64), AppError> {
        let mut matched: Vec<Tag> = self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| match search {
                Some(s) => matches(&t.name, s),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(page(matched, skip, limit))
    }

    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<Tag>, AppError> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| matches(&t.name, query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn upsert_for_question(
        &self,
        name: &str,
        question_id: &str,
    ) -> Result<Tag, AppError> {
        let mut tags = self.tags.lock().unwrap();
        if let Some(tag) = tags.iter_mut().find(|t| t.name.eq_ignore_ascii_case(name)) {
            if !tag.questions.iter().any(|q| q == question_id) {
                tag.questions.push(question_id.to_string());
            }
            return Ok(tag.clone());
        }

        let tag = Tag {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            questions: vec![question_id.to_string()],
            followers: Vec::new(),
            created_on: chrono::Utc::now(),
        };
        tags.push(tag.clone());
        Ok(tag)
    }

    async fn find_popular(&self, limit: u64) -> Result<Vec<PopularTag>, AppError> {
        let mut ranked: Vec<PopularTag> = self
            .tags
            .lock()
            .unwrap()
            .iter()
            .map(|t| PopularTag {
                id: t.id.clone(),
                name: t.name.clone(),
                question_count: t.questions.len() as u64,
            })
            .collect();
        ranked.sort_by(|a, b| b.question_count.cmp(&a.question_count));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    async fn pull_question(&self, question_id: &str) -> Result<u64, AppError> {
        let mut tags = self.tags.lock().unwrap();
        let mut touched = 0;
        for tag in tags.iter_mut() {
            if tag.questions.iter().any(|q| q == question_id) {
                tag.questions.retain(|q| q != question_id);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

// -- Interactions --

#[derive(Default)]
pub struct InMemoryInteractionRepository {
    interactions: Mutex<Vec<Interaction>>,
}

impl InMemoryInteractionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records; test helper.
    pub fn len(&self) -> usize {
        self.interactions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn insert(&self, interaction: Interaction) -> Result<(), AppError> {
        self.interactions.lock().unwrap().push(interaction);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Interaction>, AppError> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user == user_id)
            .cloned()
            .collect())
    }

    async fn has_viewed(&self, user_id: &str, question_id: &str) -> Result<bool, AppError> {
        Ok(self.interactions.lock().unwrap().iter().any(|i| {
            i.user == user_id
                && i.action == InteractionAction::View
                && i.question.as_deref() == Some(question_id)
        }))
    }

    async fn delete_by_question(&self, question_id: &str) -> Result<u64, AppError> {
        let mut interactions = self.interactions.lock().unwrap();
        let before = interactions.len();
        interactions.retain(|i| i.question.as_deref() != Some(question_id));
        Ok((before - interactions.len()) as u64)
    }

    async fn delete_by_answer(&self, answer_id: &str) -> Result<u64, AppError> {
        let mut interactions = self.interactions.lock().unwrap();
        let before = interactions.len();
        interactions.retain(|i| i.answer.as_deref() != Some(answer_id));
        Ok((before - interactions.len()) as u64)
    }
}
