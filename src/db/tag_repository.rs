use serde::{Deserialize, Serialize};

use async_trait::async_trait;

use crate::db::models::Tag;
use crate::db::question_repository::substring_filter;
use crate::error::AppError;

/// A tag ranked by how many questions carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularTag {
    pub id: String,
    pub name: String,
    pub question_count: u64,
}

/// Repository trait for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Find a tag by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Tag>, AppError>;

    /// Fetch a batch of tags by id (order unspecified).
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Tag>, AppError>;

    /// List tags, optionally filtered by a name substring.
    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Tag>, u64), AppError>;

    /// Case-insensitive substring match on tag names, for global search.
    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<Tag>, AppError>;

    /// Upsert by case-insensitive name and record the question against the
    /// tag, in one atomic step. Returns the (created or existing) tag.
    async fn upsert_for_question(&self, name: &str, question_id: &str)
        -> Result<Tag, AppError>;

    /// Tags ranked by question count, descending.
    async fn find_popular(&self, limit: u64) -> Result<Vec<PopularTag>, AppError>;

    /// Strip a deleted question's id from every tag that references it
    /// (cascade step). Returns the number of tags touched.
    async fn pull_question(&self, question_id: &str) -> Result<u64, AppError>;
}

/// MongoDB implementation of the TagRepository.
pub struct MongoTagRepository {
    collection: mongodb::Collection<Tag>,
}

impl MongoTagRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("tags"),
        }
    }
}

#[async_trait]
impl TagRepository for MongoTagRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tag>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Tag>, AppError> {
        use mongodb::bson::doc;

        let mut cursor = self
            .collection
            .find(doc! { "id": { "$in": ids } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        use futures::TryStreamExt;
        while let Some(tag) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            tags.push(tag);
        }

        Ok(tags)
    }

    async fn list(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Tag>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let filter = match search {
            Some(search) => substring_filter("name", search),
            None => doc! {},
        };

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder()
            .sort(doc! { "name": 1 })
            .skip(skip)
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        use futures::TryStreamExt;
        while let Some(tag) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            tags.push(tag);
        }

        Ok((tags, total))
    }

    async fn search_by_name(&self, query: &str, limit: u64) -> Result<Vec<Tag>, AppError> {
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().limit(limit as i64).build();

        let mut cursor = self
            .collection
            .find(substring_filter("name", query))
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        use futures::TryStreamExt;
        while let Some(tag) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            tags.push(tag);
        }

        Ok(tags)
    }

    async fn upsert_for_question(
        &self,
        name: &str,
        question_id: &str,
    ) -> Result<Tag, AppError> {
        use chrono::{SecondsFormat, Utc};
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        // Whole-name match, case-insensitive: "Rust" and "rust" are the
        // same tag. $setOnInsert seeds the document on first use; the
        // question back-reference is added either way.
        let filter = doc! {
            "name": { "$regex": format!("^{}$", regex::escape(name)), "$options": "i" }
        };
        let update = doc! {
            "$setOnInsert": {
                "id": uuid::Uuid::new_v4().to_string(),
                "name": name,
                "description": "",
                "followers": [],
                "created_on": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            "$addToSet": { "questions": question_id },
        };

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let tag = self
            .collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::Database(format!("upsert of tag '{}' returned no document", name))
            })?;

        Ok(tag)
    }

    async fn find_popular(&self, limit: u64) -> Result<Vec<PopularTag>, AppError> {
        use mongodb::bson::{doc, from_document};

        let pipeline = vec![
            doc! { "$project": {
                "id": 1,
                "name": 1,
                "question_count": { "$size": "$questions" },
            } },
            doc! { "$sort": { "question_count": -1 } },
            doc! { "$limit": limit as i64 },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        use futures::TryStreamExt;
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let tag: PopularTag =
                from_document(document).map_err(|e| AppError::Database(e.to_string()))?;
            tags.push(tag);
        }

        Ok(tags)
    }

    async fn pull_question(&self, question_id: &str) -> Result<u64, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_many(
                doc! { "questions": question_id },
                doc! { "$pull": { "questions": question_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.modified_count)
    }
}
