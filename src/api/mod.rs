pub mod books;
pub mod copy;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod health;
pub mod location;
pub mod member;
pub mod search;
pub mod transaction;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/copies", get(copy::get_book_copies))
        // Copies
        .route("/copies", get(copy::list_copies).post(copy::create_copy))
        .route("/copies/return", post(transaction::return_copy))
        .route(
            "/copies/:id",
            get(copy::get_copy)
                .put(copy::update_copy)
                .delete(copy::delete_copy),
        )
        // Members
        .route(
            "/members",
            get(member::list_members).post(member::create_member),
        )
        .route(
            "/members/:id",
            get(member::get_member)
                .put(member::update_member)
                .delete(member::delete_member),
        )
        // Locations
        .route(
            "/locations",
            get(location::list_locations).post(location::create_location),
        )
        .route(
            "/locations/:location_id/contents",
            get(location::location_contents),
        )
        // Circulation
        .route("/transactions", get(transaction::list_transactions))
        .route("/transactions/issue", post(transaction::issue_copy))
        .route(
            "/transactions/:id/return",
            put(transaction::return_transaction),
        )
        // Reports
        .route("/search", get(search::search_books))
        .route("/dashboard", get(dashboard::get_dashboard))
        // Data
        .route("/import/books", post(data::import_books))
        .route("/export/books.csv", get(data::export_books))
        .with_state(state)
}
