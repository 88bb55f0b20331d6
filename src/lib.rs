pub mod auth;
pub mod categories;
pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod extract;
pub mod models;
pub mod pagination;
pub mod transaction;
pub mod tree;
pub mod utils;

use axum::{
    Router,
    routing::{get, post},
};

// Re-export types at crate root for convenient importing
pub use crate::database::Db;
pub use crate::errors::ServiceError;
pub use crate::transaction::{TransactionError, with_transaction};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Database holding users, tokens and categories
    pub db: Db,
}

/// Builds the service router without transport layers (CORS is added by the binary).
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/categories",
            post(categories::create_category).get(categories::get_categories),
        )
        .route(
            "/categories/",
            post(categories::create_category).get(categories::get_categories),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .with_state(app_state)
}
