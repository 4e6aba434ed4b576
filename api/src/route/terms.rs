use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::terms::{accept_terms, validate_terms};

pub fn build_terms_routers() -> Router<AppRegistry> {
    let terms_routers = Router::new()
        .route("/validation", get(validate_terms))
        .route("/acceptances", post(accept_terms));

    Router::new().nest("/terms", terms_routers)
}
