use async_trait::async_trait;

use crate::db::models::{Answer, VoteUpdate};
use crate::db::question_repository::substring_filter;
use crate::error::AppError;

/// Repository trait for answer operations.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Insert a new answer.
    async fn insert(&self, answer: Answer) -> Result<(), AppError>;

    /// Find an answer by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Answer>, AppError>;

    /// All answers to a question, newest first.
    async fn find_by_question(&self, question_id: &str) -> Result<Vec<Answer>, AppError>;

    /// Case-insensitive substring match on answer bodies, for global search.
    async fn search_by_content(&self, query: &str, limit: u64) -> Result<Vec<Answer>, AppError>;

    /// Apply a vote-set mutation atomically. Returns the updated answer,
    /// or `None` when the id is unknown.
    async fn apply_vote(&self, id: &str, update: &VoteUpdate)
        -> Result<Option<Answer>, AppError>;

    /// Delete an answer. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Delete every answer to a question (cascade step). Returns the number
    /// of answers removed.
    async fn delete_by_question(&self, question_id: &str) -> Result<u64, AppError>;
}

/// MongoDB implementation of the AnswerRepository.
pub struct MongoAnswerRepository {
    collection: mongodb::Collection<Answer>,
}

impl MongoAnswerRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("answers"),
        }
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn insert(&self, answer: Answer) -> Result<(), AppError> {
        self.collection
            .insert_one(&answer)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Answer>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_question(&self, question_id: &str) -> Result<Vec<Answer>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let mut cursor = self
            .collection
            .find(doc! { "question": question_id })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut answers = Vec::new();
        use futures::TryStreamExt;
        while let Some(answer) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            answers.push(answer);
        }

        Ok(answers)
    }

    async fn search_by_content(&self, query: &str, limit: u64) -> Result<Vec<Answer>, AppError> {
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().limit(limit as i64).build();

        let mut cursor = self
            .collection
            .find(substring_filter("content", query))
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut answers = Vec::new();
        use futures::TryStreamExt;
        while let Some(answer) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            answers.push(answer);
        }

        Ok(answers)
    }

    async fn apply_vote(
        &self,
        id: &str,
        update: &VoteUpdate,
    ) -> Result<Option<Answer>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "id": id }, update.to_update_doc())
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_by_question(&self, question_id: &str) -> Result<u64, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_many(doc! { "question": question_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count)
    }
}
