mod common;

use axum::http::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn recommendations_follow_tag_affinity() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("reader").await;

    let viewed = env
        .ask(&server, "asker", "A rust question the reader viewed", &["rust"])
        .await;
    let related = env
        .ask(&server, "asker", "Another rust question", &["rust"])
        .await;
    env.ask(&server, "asker", "An unrelated cooking question", &["cooking"])
        .await;

    // Viewing gives the reader a rust affinity.
    server
        .post(&format!("/api/v1/questions/{}/view", viewed))
        .json(&serde_json::json!({ "user_id": "reader" }))
        .await;

    let page = server
        .get("/api/v1/questions/recommended")
        .add_query_param("user_id", "auth|reader")
        .await
        .json::<Value>();
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();

    assert!(ids.contains(&viewed.as_str()));
    assert!(ids.contains(&related.as_str()));
    assert_eq!(ids.len(), 2, "the cooking question must not be recommended");
}

#[tokio::test]
async fn own_questions_are_never_recommended() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("other").await;

    // Asking logs an interaction, so the asker has a rust affinity; their
    // own question still must not come back.
    env.ask(&server, "asker", "The asker's own rust question", &["rust"])
        .await;
    let someone_elses = env
        .ask(&server, "other", "Someone else's rust question", &["rust"])
        .await;

    let page = server
        .get("/api/v1/questions/recommended")
        .add_query_param("user_id", "auth|asker")
        .await
        .json::<Value>();
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();

    assert_eq!(ids, vec![someone_elses.as_str()]);
}

#[tokio::test]
async fn no_history_means_an_empty_page() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.seed_user("asker").await;
    env.seed_user("lurker").await;
    env.ask(&server, "asker", "A question the lurker never saw", &["rust"])
        .await;

    let page = server
        .get("/api/v1/questions/recommended")
        .add_query_param("user_id", "auth|lurker")
        .await
        .json::<Value>();

    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["is_next"], false);
}

#[tokio::test]
async fn unknown_user_is_404() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .get("/api/v1/questions/recommended")
        .add_query_param("user_id", "auth|nobody")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
