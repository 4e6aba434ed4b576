use axum::{routing::post, Router};
use registry::AppRegistry;

use crate::handler::subscription::create_subscription;

pub fn build_subscription_routers() -> Router<AppRegistry> {
    Router::new().route("/subscriptions", post(create_subscription))
}
