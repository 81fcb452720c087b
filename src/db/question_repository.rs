use async_trait::async_trait;

use crate::db::list_query::{QuestionListFilter, QuestionListQuery};
use crate::db::models::{Question, VoteSide, VoteUpdate};
use crate::error::AppError;

/// Repository trait for question operations.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a new question.
    async fn insert(&self, question: Question) -> Result<(), AppError>;

    /// Find a question by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError>;

    /// List questions for the home page. Returns the page slice and the
    /// total number of matches for the same filter.
    async fn list(&self, query: &QuestionListQuery) -> Result<(Vec<Question>, u64), AppError>;

    /// Questions carrying any of `tag_ids`, excluding those asked by
    /// `exclude_author`, with an optional title/content substring filter.
    async fn find_recommended(
        &self,
        tag_ids: &[String],
        exclude_author: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError>;

    /// Questions tagged with `tag_id`, newest first, with an optional title
    /// substring filter.
    async fn find_by_tag(
        &self,
        tag_id: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError>;

    /// A subset of questions by id (a user's saved collection), newest
    /// first, with an optional title/content substring filter.
    async fn find_saved(
        &self,
        ids: &[String],
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError>;

    /// The most active questions: views descending, then upvote count.
    async fn find_hot(&self, limit: u64) -> Result<Vec<Question>, AppError>;

    /// Case-insensitive substring match on titles, for global search.
    async fn search_by_title(&self, query: &str, limit: u64) -> Result<Vec<Question>, AppError>;

    /// Replace title and content. Returns `false` when the id is unknown.
    async fn update_content(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, AppError>;

    /// Apply a vote-set mutation atomically. Returns the updated question,
    /// or `None` when the id is unknown.
    async fn apply_vote(
        &self,
        id: &str,
        update: &VoteUpdate,
    ) -> Result<Option<Question>, AppError>;

    /// Record a new answer on the question. Returns `false` when the id is
    /// unknown.
    async fn add_answer(&self, id: &str, answer_id: &str) -> Result<bool, AppError>;

    /// Drop an answer reference from the question.
    async fn pull_answer(&self, id: &str, answer_id: &str) -> Result<(), AppError>;

    /// Bump the view counter. Returns `false` when the id is unknown.
    async fn increment_views(&self, id: &str) -> Result<bool, AppError>;

    /// Delete a question. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// MongoDB implementation of the QuestionRepository.
pub struct MongoQuestionRepository {
    collection: mongodb::Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("questions"),
        }
    }
}

/// Build a case-insensitive substring `$regex` clause for one field.
pub(crate) fn substring_filter(field: &str, query: &str) -> mongodb::bson::Document {
    use mongodb::bson::doc;

    doc! { field: { "$regex": regex::escape(query), "$options": "i" } }
}

impl VoteUpdate {
    /// Render this mutation as a MongoDB update document.
    pub(crate) fn to_update_doc(&self) -> mongodb::bson::Document {
        use mongodb::bson::doc;

        let field = |side: VoteSide| match side {
            VoteSide::Up => "upvotes",
            VoteSide::Down => "downvotes",
        };

        let mut update = doc! {};
        if let Some(side) = self.remove {
            update.insert("$pull", doc! { field(side): &self.user_id });
        }
        if let Some(side) = self.add {
            update.insert("$addToSet", doc! { field(side): &self.user_id });
        }
        update
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn insert(&self, question: Question) -> Result<(), AppError> {
        self.collection
            .insert_one(&question)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self, query: &QuestionListQuery) -> Result<(Vec<Question>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let mut filter = doc! {};
        if let Some(search) = query.search.as_deref() {
            filter.insert(
                "$or",
                vec![
                    substring_filter("title", search),
                    substring_filter("content", search),
                ],
            );
        }

        let mut sort = doc! {};
        match query.filter {
            Some(QuestionListFilter::Newest) => {
                sort = doc! { "created_at": -1 };
            }
            Some(QuestionListFilter::Frequent) => {
                sort = doc! { "views": -1 };
            }
            Some(QuestionListFilter::Unanswered) => {
                filter.insert("answers", doc! { "$size": 0 });
            }
            None => {}
        }

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder()
            .sort(sort)
            .skip(query.skip)
            .limit(query.limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(question) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            questions.push(question);
        }

        Ok((questions, total))
    }

    async fn find_recommended(
        &self,
        tag_ids: &[String],
        exclude_author: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let mut filter = doc! {
            "$and": [
                { "tags": { "$in": tag_ids } },
                { "author": { "$ne": exclude_author } },
            ],
        };
        if let Some(search) = search {
            filter.insert(
                "$or",
                vec![
                    substring_filter("title", search),
                    substring_filter("content", search),
                ],
            );
        }

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder().skip(skip).limit(limit as i64).build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(question) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            questions.push(question);
        }

        Ok((questions, total))
    }

    async fn find_by_tag(
        &self,
        tag_id: &str,
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let mut filter = doc! { "tags": tag_id };
        if let Some(search) = search {
            filter.extend(substring_filter("title", search));
        }

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(question) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            questions.push(question);
        }

        Ok((questions, total))
    }

    async fn find_saved(
        &self,
        ids: &[String],
        search: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Question>, u64), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let mut filter = doc! { "id": { "$in": ids } };
        if let Some(search) = search {
            filter.insert(
                "$or",
                vec![
                    substring_filter("title", search),
                    substring_filter("content", search),
                ],
            );
        }

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(question) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            questions.push(question);
        }

        Ok((questions, total))
    }

    async fn find_hot(&self, limit: u64) -> Result<Vec<Question>, AppError> {
        use mongodb::bson::{doc, from_document};

        // Sorting by the upvote *count* needs a computed field, so this one
        // goes through the aggregation pipeline.
        let pipeline = vec![
            doc! { "$addFields": { "upvote_count": { "$size": "$upvotes" } } },
            doc! { "$sort": { "views": -1, "upvote_count": -1 } },
            doc! { "$limit": limit as i64 },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let question: Question =
                from_document(document).map_err(|e| AppError::Database(e.to_string()))?;
            questions.push(question);
        }

        Ok(questions)
    }

    async fn search_by_title(&self, query: &str, limit: u64) -> Result<Vec<Question>, AppError> {
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().limit(limit as i64).build();

        let mut cursor = self
            .collection
            .find(substring_filter("title", query))
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut questions = Vec::new();
        use futures::TryStreamExt;
        while let Some(question) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            questions.push(question);
        }

        Ok(questions)
    }

    async fn update_content(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "title": title, "content": content } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn apply_vote(
        &self,
        id: &str,
        update: &VoteUpdate,
    ) -> Result<Option<Question>, AppError> {
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

    async fn add_answer(&self, id: &str, answer_id: &str) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$addToSet": { "answers": answer_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn pull_answer(&self, id: &str, answer_id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        self.collection
            .update_one(doc! { "id": id }, doc! { "$pull": { "answers": answer_id } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$inc": { "views": 1 } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
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
}
