use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Build the full `/api/v1` router over the given state.
///
/// Shared between `main` and the integration tests so both exercise the
/// same routing table.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/questions",
            get(api::questions::list_questions_handler)
                .post(api::questions::create_question_handler),
        )
        .route(
            "/api/v1/questions/hot",
            get(api::questions::hot_questions_handler),
        )
        .route(
            "/api/v1/questions/recommended",
            get(api::questions::recommended_questions_handler),
        )
        .route(
            "/api/v1/questions/{id}",
            get(api::questions::get_question_handler)
                .put(api::questions::edit_question_handler)
                .delete(api::questions::delete_question_handler),
        )
        .route(
            "/api/v1/questions/{id}/view",
            post(api::interactions::view_question_handler),
        )
        .route(
            "/api/v1/questions/{id}/vote",
            post(api::votes::question_vote_handler),
        )
        .route(
            "/api/v1/questions/{id}/answers",
            get(api::answers::list_answers_handler),
        )
        .route("/api/v1/answers", post(api::answers::create_answer_handler))
        .route(
            "/api/v1/answers/{id}",
            delete(api::answers::delete_answer_handler),
        )
        .route(
            "/api/v1/answers/{id}/vote",
            post(api::votes::answer_vote_handler),
        )
        .route("/api/v1/tags", get(api::tags::list_tags_handler))
        .route("/api/v1/tags/popular", get(api::tags::popular_tags_handler))
        .route(
            "/api/v1/tags/{id}/questions",
            get(api::tags::tag_questions_handler),
        )
        .route("/api/v1/users", get(api::users::list_users_handler))
        .route("/api/v1/users/{auth_id}", get(api::users::get_user_handler))
        .route(
            "/api/v1/users/{auth_id}/top-tags",
            get(api::tags::top_tags_handler),
        )
        .route(
            "/api/v1/users/{auth_id}/saved",
            get(api::users::saved_questions_handler),
        )
        .route(
            "/api/v1/users/{auth_id}/saved/toggle",
            post(api::users::toggle_save_handler),
        )
        .route("/api/v1/search", get(api::search::search_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
