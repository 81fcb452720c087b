use std::sync::Arc;

use axum::Router;
use chrono::Utc;

use devflow::db::memory::{
    InMemoryAnswerRepository, InMemoryInteractionRepository, InMemoryQuestionRepository,
    InMemoryTagRepository, InMemoryUserRepository,
};
use devflow::db::models::User;
use devflow::revalidate::RecordingRevalidator;
use devflow::routes::build_router;
use devflow::state::{AppConfig, AppState};

/// In-memory application environment for integration tests.
///
/// The router is the real one from `devflow::routes`; only the storage
/// behind the repository traits is swapped for in-memory implementations,
/// so the full handler → action → repository path is exercised.
pub struct TestEnv {
    pub router: Router,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub answers: Arc<InMemoryAnswerRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub tags: Arc<InMemoryTagRepository>,
    pub interactions: Arc<InMemoryInteractionRepository>,
    pub revalidator: Arc<RecordingRevalidator>,
}

impl TestEnv {
    pub fn start() -> Self {
        let questions = Arc::new(InMemoryQuestionRepository::new());
        let answers = Arc::new(InMemoryAnswerRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let tags = Arc::new(InMemoryTagRepository::new());
        let interactions = Arc::new(InMemoryInteractionRepository::new());
        let revalidator = Arc::new(RecordingRevalidator::new());

        let state = AppState {
            questions: questions.clone(),
            answers: answers.clone(),
            users: users.clone(),
            tags: tags.clone(),
            interactions: interactions.clone(),
            revalidator: revalidator.clone(),
            config: AppConfig {
                mongodb_uri: "mongodb://unused".to_string(),
                database: "devflow_test".to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
            },
        };

        Self {
            router: build_router(state),
            questions,
            answers,
            users,
            tags,
            interactions,
            revalidator,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for
    /// error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: seed a user directly (account creation is the identity
    /// provider's webhook business, not this API's).
    pub async fn seed_user(&self, id: &str) -> User {
        let user = User {
            id: id.to_string(),
            auth_id: format!("auth|{}", id),
            name: format!("User {}", id),
            username: id.to_string(),
            email: format!("{}@example.com", id),
            bio: None,
            picture: "https://example.com/avatar.png".to_string(),
            location: None,
            portfolio_website: None,
            reputation: 0,
            saved: vec![],
            joined_at: Utc::now(),
        };
        use devflow::db::user_repository::UserRepository;
        self.users.insert(user.clone()).await.expect("seed user");
        user
    }

    /// Helper: ask a question via the API, returning its id.
    pub async fn ask(
        &self,
        server: &axum_test::TestServer,
        author: &str,
        title: &str,
        tags: &[&str],
    ) -> String {
        let response = server
            .post("/api/v1/questions")
            .json(&serde_json::json!({
                "title": title,
                "content": long_content(),
                "tags": tags,
                "author": author,
                "path": "/"
            }))
            .await;
        response.json::<serde_json::Value>()["id"]
            .as_str()
            .expect("question id")
            .to_string()
    }

    /// Helper: answer a question via the API, returning the answer id.
    pub async fn answer(
        &self,
        server: &axum_test::TestServer,
        author: &str,
        question_id: &str,
    ) -> String {
        let response = server
            .post("/api/v1/answers")
            .json(&serde_json::json!({
                "content": long_content(),
                "author": author,
                "question": question_id,
                "path": format!("/question/{}", question_id)
            }))
            .await;
        response.json::<serde_json::Value>()["id"]
            .as_str()
            .expect("answer id")
            .to_string()
    }

    /// Helper: cast a vote via the API.
    pub async fn vote(
        &self,
        server: &axum_test::TestServer,
        target: VoteTarget<'_>,
        user_id: &str,
        kind: &str,
        has_upvoted: bool,
        has_downvoted: bool,
    ) -> axum_test::TestResponse {
        let url = match target {
            VoteTarget::Question(id) => format!("/api/v1/questions/{}/vote", id),
            VoteTarget::Answer(id) => format!("/api/v1/answers/{}/vote", id),
        };
        server
            .post(&url)
            .json(&serde_json::json!({
                "user_id": user_id,
                "kind": kind,
                "has_upvoted": has_upvoted,
                "has_downvoted": has_downvoted,
                "path": "/"
            }))
            .await
    }
}

pub enum VoteTarget<'a> {
    Question(&'a str),
    Answer(&'a str),
}

/// A body long enough to clear the 100-character minimum.
pub fn long_content() -> String {
    "This is a sufficiently long body of text that comfortably clears the minimum \
     content length validation enforced by the API."
        .to_string()
}
