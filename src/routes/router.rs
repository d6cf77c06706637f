// Router Configuration
//
// Assembles all HTTP routes:
//
// - `/api/auth/*` - signup and login are public; `me` sits behind auth
// - `/api/*` - everything else requires a Bearer token
// - `/ws/chat` - WebSocket; authenticates its own token query parameter
// - `/health` - unauthenticated liveness probe
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::handlers as auth_handlers;
use crate::borrowing::handlers as borrowing_handlers;
use crate::catalog::handlers as catalog_handlers;
use crate::chat::ws::chat_ws;
use crate::dashboard::handlers as dashboard_handlers;
use crate::members::handlers as member_handlers;
use crate::middleware::auth::auth_middleware;
use crate::reviews::handlers as review_handlers;
use crate::server::state::AppState;
use crate::submissions::handlers as submission_handlers;

/// Create the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth_handlers::me))
        .route("/api/members/profile", get(member_handlers::profile))
        .route(
            "/api/members/average-return-rate",
            get(member_handlers::average_rate),
        )
        .route("/api/members", get(member_handlers::list))
        .route(
            "/api/borrow/run-overdue-sweep",
            post(borrowing_handlers::run_sweep),
        )
        .route(
            "/api/borrow/{branch_inventory_id}",
            post(borrowing_handlers::borrow),
        )
        .route(
            "/api/return/{borrow_id}",
            patch(borrowing_handlers::return_borrowed),
        )
        .route("/api/authors", post(catalog_handlers::post_author))
        .route(
            "/api/authors/{author_id}",
            delete(catalog_handlers::delete_author),
        )
        .route(
            "/api/branches",
            get(catalog_handlers::get_branches).post(catalog_handlers::post_branch),
        )
        .route(
            "/api/branches/{branch_id}/inventory",
            get(catalog_handlers::get_branch_inventory),
        )
        .route(
            "/api/books",
            get(catalog_handlers::get_books).post(catalog_handlers::post_book),
        )
        .route(
            "/api/books/{book_id}",
            get(catalog_handlers::get_book)
                .put(catalog_handlers::put_book)
                .delete(catalog_handlers::delete_book),
        )
        .route(
            "/api/books/{book_id}/reviews",
            get(review_handlers::get_book_reviews).post(review_handlers::post_review),
        )
        .route(
            "/api/book-requests",
            get(submission_handlers::list).post(submission_handlers::submit),
        )
        .route(
            "/api/book-requests/{request_id}/accept",
            patch(submission_handlers::accept),
        )
        .route(
            "/api/book-requests/{request_id}/reject",
            patch(submission_handlers::reject),
        )
        .route("/api/inventory", post(catalog_handlers::post_inventory))
        .route("/api/dashboard", get(dashboard_handlers::dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth_handlers::signup))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/ws/chat", get(chat_ws))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
