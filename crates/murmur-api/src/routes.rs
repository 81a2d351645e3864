use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{AppState, thoughts, users};

pub const WRONG_ROUTE: &str = "Wrong route!";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/users/{user_id}/friends/{friend_id}",
            post(users::add_friend).delete(users::remove_friend),
        )
        .route(
            "/api/thoughts",
            get(thoughts::list_thoughts).post(thoughts::create_thought),
        )
        .route(
            "/api/thoughts/{thought_id}",
            get(thoughts::get_thought)
                .put(thoughts::update_thought)
                .delete(thoughts::delete_thought),
        )
        .route(
            "/api/thoughts/{thought_id}/reactions",
            post(thoughts::add_reaction),
        )
        .route(
            "/api/thoughts/{thought_id}/reactions/{reaction_id}",
            delete(thoughts::remove_reaction),
        )
        .fallback(wrong_route)
        .with_state(state)
}

async fn wrong_route() -> &'static str {
    WRONG_ROUTE
}
