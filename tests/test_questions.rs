mod common;

use axum::http::StatusCode;
use devflow::db::interaction_repository::InteractionRepository;
use devflow::models::page::Paged;

use devflow::db::models::Question;

#[tokio::test]
async fn create_then_fetch_question() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    let id = env
        .ask(&server, "asker", "How do I pin a future?", &["rust", "async"])
        .await;

    let question = server
        .get(&format!("/api/v1/questions/{}", id))
        .await
        .json::<Question>();
    assert_eq!(question.title, "How do I pin a future?");
    assert_eq!(question.tags.len(), 2);
    assert_eq!(question.author, "asker");
}

#[tokio::test]
async fn create_rejects_invalid_payloads() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    env.seed_user("asker").await;

    // Title too short.
    let response = server
        .post("/api/v1/questions")
        .json(&serde_json::json!({
            "title": "Why",
            "content": common::long_content(),
            "tags": ["rust"],
            "author": "asker",
            "path": "/"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // Too many tags.
    let response = server
        .post("/api/v1/questions")
        .json(&serde_json::json!({
            "title": "A perfectly fine title",
            "content": common::long_content(),
            "tags": ["a", "b", "c", "d"],
            "author": "asker",
            "path": "/"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // Body too short.
    let response = server
        .post("/api/v1/questions")
        .json(&serde_json::json!({
            "title": "A perfectly fine title",
            "content": "Too short.",
            "tags": ["rust"],
            "author": "asker",
            "path": "/"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn listing_paginates_with_is_next() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    for n in 0..5 {
        env.ask(&server, "asker", &format!("Question number {}", n), &["rust"])
            .await;
    }

    let page = server
        .get("/api/v1/questions")
        .add_query_param("page", 2)
        .add_query_param("page_size", 2)
        .await
        .json::<Paged<Question>>();
    assert_eq!(page.items.len(), 2);
    assert!(page.is_next);

    let page = server
        .get("/api/v1/questions")
        .add_query_param("page", 3)
        .add_query_param("page_size", 2)
        .await
        .json::<Paged<Question>>();
    assert_eq!(page.items.len(), 1);
    assert!(!page.is_next);
}

#[tokio::test]
async fn listing_filters_unanswered_and_search() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("answerer").await;
    let answered = env
        .ask(&server, "asker", "Answered question about tokio", &["rust"])
        .await;
    env.ask(&server, "asker", "Open question about serde", &["rust"])
        .await;
    env.answer(&server, "answerer", &answered).await;

    let page = server
        .get("/api/v1/questions")
        .add_query_param("filter", "unanswered")
        .await
        .json::<Paged<Question>>();
    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].title.contains("serde"));

    let page = server
        .get("/api/v1/questions")
        .add_query_param("q", "TOKIO")
        .await
        .json::<Paged<Question>>();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, answered);
}

#[tokio::test]
async fn edit_replaces_title_and_content() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    let id = env.ask(&server, "asker", "Original question title", &["rust"]).await;

    server
        .put(&format!("/api/v1/questions/{}", id))
        .json(&serde_json::json!({
            "title": "Clarified question title",
            "content": common::long_content(),
            "path": format!("/question/{}", id)
        }))
        .await;

    let question = server
        .get(&format!("/api/v1/questions/{}", id))
        .await
        .json::<Question>();
    assert_eq!(question.title, "Clarified question title");
}

#[tokio::test]
async fn delete_cascades_to_answers_interactions_and_tags() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("answerer").await;
    let id = env.ask(&server, "asker", "Question to be removed", &["doomed"]).await;
    env.answer(&server, "answerer", &id).await;
    env.answer(&server, "answerer", &id).await;

    // Ask + two answers = three interactions referencing the question.
    assert_eq!(env.interactions.len(), 3);

    server
        .delete(&format!("/api/v1/questions/{}", id))
        .add_query_param("path", "/")
        .await;

    let permissive = env.server_permissive();
    let response = permissive.get(&format!("/api/v1/questions/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let answers = server
        .get(&format!("/api/v1/questions/{}/answers", id))
        .await
        .json::<Vec<devflow::db::models::Answer>>();
    assert!(answers.is_empty());

    assert_eq!(env.interactions.len(), 0);

    // The tag survives but no longer references the question.
    use devflow::db::tag_repository::TagRepository;
    let (tags, _) = env.tags.list(None, 0, 10).await.unwrap();
    assert!(tags.iter().all(|t| t.questions.is_empty()));
}

#[tokio::test]
async fn hot_questions_ranked_by_views() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    let quiet = env.ask(&server, "asker", "A question nobody reads", &["rust"]).await;
    let busy = env.ask(&server, "asker", "A question everyone reads", &["rust"]).await;

    for _ in 0..3 {
        server
            .post(&format!("/api/v1/questions/{}/view", busy))
            .json(&serde_json::json!({}))
            .await;
    }

    let hot = server
        .get("/api/v1/questions/hot")
        .await
        .json::<Vec<Question>>();
    assert_eq!(hot[0].id, busy);
    assert_eq!(hot[1].id, quiet);
}

#[tokio::test]
async fn views_count_once_per_user_in_the_log() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("reader").await;
    let id = env.ask(&server, "asker", "A question with readers", &["rust"]).await;

    for _ in 0..2 {
        server
            .post(&format!("/api/v1/questions/{}/view", id))
            .json(&serde_json::json!({ "user_id": "reader" }))
            .await;
    }

    let question = server
        .get(&format!("/api/v1/questions/{}", id))
        .await
        .json::<Question>();
    assert_eq!(question.views, 2);

    let history = env.interactions.find_by_user("reader").await.unwrap();
    assert_eq!(history.len(), 1);
}
