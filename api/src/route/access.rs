use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::{
    access::{show_access, show_availability, show_recommendation},
    grant::{create_purchase, create_rental},
};

pub fn build_book_routers() -> Router<AppRegistry> {
    let books_routers = Router::new()
        .route("/:book_id/access", get(show_access))
        .route("/:book_id/availability/:format", get(show_availability))
        .route("/:book_id/recommendation", get(show_recommendation))
        .route("/:book_id/rentals", post(create_rental))
        .route("/:book_id/purchases", post(create_purchase));

    Router::new().nest("/books", books_routers)
}
