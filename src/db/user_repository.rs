use async_trait::async_trait;

use crate::db::models::User;
use crate::db::question_repository::substring_filter;
use crate::error::AppError;

/// Repository trait for user operations.
///
/// Reputation has no general write path on purpose: `adjust_reputation` is
/// the only mutation, and only the vote/ask actions call it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn insert(&self, user: User) -> Result<(), AppError>;

    /// Find a user by internal id.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Find a user by the external identity provider id.
    async fn find_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, AppError>;

    /// List users, optionally filtered by a name/username substring.
    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64), AppError>;

    /// Case-insensitive substring match on display names, for global search.
    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<User>, AppError>;

    /// Add `delta` to the user's reputation. Returns `false` when the id is
    /// unknown.
    async fn adjust_reputation(&self, id: &str, delta: i64) -> Result<bool, AppError>;

    /// Add a question to the user's saved collection.
    async fn save_question(&self, id: &str, question_id: &str) -> Result<(), AppError>;

    /// Remove a question from the user's saved collection.
    async fn unsave_question(&self, id: &str, question_id: &str) -> Result<(), AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: User) -> Result<(), AppError> {
        self.collection
            .insert_one(&user)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "auth_id": auth_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let mut filter = doc! {};
        if let Some(search) = search {
            filter.insert(
                "$or",
                vec![
                    substring_filter("name", search),
                    substring_filter("username", search),
                ],
            );
        }

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder()
            .sort(doc! { "joined_at": -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut users = Vec::new();
        use futures::TryStreamExt;
        while let Some(user) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(user);
        }

        Ok((users, total))
    }

    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<User>, AppError> {
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().limit(limit as i64).build();

        let mut cursor = self
            .collection
            .find(substring_filter("name", query))
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut users = Vec::new();
        use futures::TryStreamExt;
        while let Some(user) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(user);
        }

        Ok(users)
    }

    async fn adjust_reputation(&self, id: &str, delta: i64) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$inc": { "reputation": delta } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn save_question(&self, id: &str, question_id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$addToSet": { "saved": question_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn unsave_question(&self, id: &str, question_id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        self.collection
            .update_one(doc! { "id": id }, doc! { "$pull": { "saved": question_id } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
