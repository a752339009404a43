// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, comments, posts, reactions, users},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, posts, comments, reactions).
/// * Protected routes sit behind `auth_middleware`, public ones do not.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores + config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(require_auth.clone()),
        );

    let user_routes = Router::new().route("/{id}", get(users::get_user)).merge(
        Router::new()
            .route("/profile", put(users::update_profile))
            .route_layer(require_auth.clone()),
    );

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/{id}", get(posts::get_post))
        .route("/user/{user_id}", get(posts::list_user_posts))
        .merge(
            Router::new()
                .route("/", post(posts::create_post))
                .route("/{id}", put(posts::update_post).delete(posts::delete_post))
                .route_layer(require_auth.clone()),
        );

    let comment_routes = Router::new()
        .route("/post/{post_id}", get(comments::list_comments))
        .merge(
            Router::new()
                .route("/", post(comments::create_comment))
                .route(
                    "/{id}",
                    put(comments::update_comment).delete(comments::delete_comment),
                )
                .route_layer(require_auth.clone()),
        );

    let reaction_routes = Router::new()
        .route("/post/{post_id}", get(reactions::get_reactions))
        .merge(
            Router::new()
                .route("/", post(reactions::react))
                .route("/post/{post_id}/user", get(reactions::get_user_reaction))
                .route("/post/{post_id}", delete(reactions::remove_reaction))
                .route_layer(require_auth),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/reactions", reaction_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
