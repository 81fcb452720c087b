use async_trait::async_trait;

use crate::db::models::{Interaction, InteractionAction};
use crate::error::AppError;

/// Repository trait for the append-only interaction log.
///
/// Records are inserted and deleted (by cascade) but never updated.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Append a record.
    async fn insert(&self, interaction: Interaction) -> Result<(), AppError>;

    /// Every record for a user, in insertion order.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Interaction>, AppError>;

    /// Whether the user already has a `View` record for the question.
    async fn has_viewed(&self, user_id: &str, question_id: &str) -> Result<bool, AppError>;

    /// Drop every record referencing a question (cascade step).
    async fn delete_by_question(&self, question_id: &str) -> Result<u64, AppError>;

    /// Drop every record referencing an answer (cascade step).
    async fn delete_by_answer(&self, answer_id: &str) -> Result<u64, AppError>;
}

/// MongoDB implementation of the InteractionRepository.
pub struct MongoInteractionRepository {
    collection: mongodb::Collection<Interaction>,
}

impl MongoInteractionRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("interactions"),
        }
    }
}

#[async_trait]
impl InteractionRepository for MongoInteractionRepository {
    async fn insert(&self, interaction: Interaction) -> Result<(), AppError> {
        self.collection
            .insert_one(&interaction)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Interaction>, AppError> {
        use mongodb::bson::doc;

        let mut cursor = self
            .collection
            .find(doc! { "user": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut interactions = Vec::new();
        use futures::TryStreamExt;
        while let Some(interaction) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            interactions.push(interaction);
        }

        Ok(interactions)
    }

    async fn has_viewed(&self, user_id: &str, question_id: &str) -> Result<bool, AppError> {
        use mongodb::bson::{doc, to_bson};

        let action = to_bson(&InteractionAction::View)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = self
            .collection
            .count_documents(doc! {
                "user": user_id,
                "action": action,
                "question": question_id,
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
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

    async fn delete_by_answer(&self, answer_id: &str) -> Result<u64, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_many(doc! { "answer": answer_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count)
    }
}
