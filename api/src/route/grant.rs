use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::grant::{activate_grant, cancel_grant, return_rental, show_grant_list};

pub fn build_grant_routers() -> Router<AppRegistry> {
    let grants_routers = Router::new()
        .route("/", get(show_grant_list))
        .route("/:grant_id/returned", put(return_rental))
        .route("/:grant_id/activated", put(activate_grant))
        .route("/:grant_id/cancelled", put(cancel_grant));

    Router::new().nest("/grants", grants_routers)
}
