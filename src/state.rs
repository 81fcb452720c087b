use std::sync::Arc;

use crate::db::answer_repository::{AnswerRepository, MongoAnswerRepository};
use crate::db::interaction_repository::{InteractionRepository, MongoInteractionRepository};
use crate::db::question_repository::{MongoQuestionRepository, QuestionRepository};
use crate::db::tag_repository::{MongoTagRepository, TagRepository};
use crate::db::user_repository::{MongoUserRepository, UserRepository};
use crate::revalidate::{LogRevalidator, Revalidator};

/// Everything a request handler needs, threaded through explicitly
/// (no ambient globals).
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub interactions: Arc<dyn InteractionRepository>,
    pub revalidator: Arc<dyn Revalidator>,
    pub config: AppConfig,
}

#[derive(Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub bind_addr: String,
}

impl AppConfig {
    /// Read configuration from the environment, with local-dev defaults.
    pub fn from_env() -> Self {
        let mongodb_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let database =
            std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "devflow".to_string());
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        Self {
            mongodb_uri,
            database,
            bind_addr,
        }
    }
}

impl AppState {
    /// Wire MongoDB-backed repositories over the given database handle.
    pub fn with_mongo(db: &mongodb::Database, config: AppConfig) -> Self {
        Self {
            questions: Arc::new(MongoQuestionRepository::new(db)),
            answers: Arc::new(MongoAnswerRepository::new(db)),
            users: Arc::new(MongoUserRepository::new(db)),
            tags: Arc::new(MongoTagRepository::new(db)),
            interactions: Arc::new(MongoInteractionRepository::new(db)),
            revalidator: Arc::new(LogRevalidator),
            config,
        }
    }
}
