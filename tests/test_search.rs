mod common;

use axum::http::StatusCode;
use devflow::models::search::{SearchKind, SearchResult};

async fn seed(env: &common::TestEnv, server: &axum_test::TestServer) -> String {
    env.seed_user("ferris").await;
    env.seed_user("answerer").await;
    let q1 = env
        .ask(server, "ferris", "Searchable question one", &["searchable"])
        .await;
    env.ask(server, "ferris", "Searchable question two", &["rust"])
        .await;
    env.ask(server, "ferris", "Searchable question three", &["serde"])
        .await;
    env.answer(server, "answerer", &q1).await;
    q1
}

#[tokio::test]
async fn unfiltered_search_caps_per_type() {
    let env = common::TestEnv::start();
    let server = env.server();
    seed(&env, &server).await;

    // "searchable" matches 3 question titles, 1 tag name; the question hits
    // must be capped at 2.
    let results = server
        .get("/api/v1/search")
        .add_query_param("q", "searchable")
        .await
        .json::<Vec<SearchResult>>();

    let questions = results
        .iter()
        .filter(|r| r.kind == SearchKind::Question)
        .count();
    assert_eq!(questions, 2);
    assert!(results.iter().any(|r| r.kind == SearchKind::Tag));
}

#[tokio::test]
async fn filtered_search_raises_the_cap() {
    let env = common::TestEnv::start();
    let server = env.server();
    seed(&env, &server).await;

    let results = server
        .get("/api/v1/search")
        .add_query_param("q", "searchable")
        .add_query_param("type", "question")
        .await
        .json::<Vec<SearchResult>>();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.kind == SearchKind::Question));
}

#[tokio::test]
async fn answer_results_navigate_to_the_question() {
    let env = common::TestEnv::start();
    let server = env.server();
    let q1 = seed(&env, &server).await;

    // The seeded answer body contains "content length" from the helper.
    let results = server
        .get("/api/v1/search")
        .add_query_param("q", "content length")
        .add_query_param("type", "answer")
        .await
        .json::<Vec<SearchResult>>();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Answers containing content length");
    assert_eq!(results[0].id, q1);
}

#[tokio::test]
async fn user_results_use_the_auth_id() {
    let env = common::TestEnv::start();
    let server = env.server();
    seed(&env, &server).await;

    let results = server
        .get("/api/v1/search")
        .add_query_param("q", "ferris")
        .add_query_param("type", "user")
        .await
        .json::<Vec<SearchResult>>();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "auth|ferris");
}

#[tokio::test]
async fn unsupported_type_is_rejected() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .get("/api/v1/search")
        .add_query_param("q", "anything")
        .add_query_param("type", "comment")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn type_filter_is_case_insensitive() {
    let env = common::TestEnv::start();
    let server = env.server();
    seed(&env, &server).await;

    let results = server
        .get("/api/v1/search")
        .add_query_param("q", "searchable")
        .add_query_param("type", "Question")
        .await
        .json::<Vec<SearchResult>>();
    assert!(!results.is_empty());
}
