use axum::Router;
use registry::AppRegistry;

use super::{
    access::build_book_routers, grant::build_grant_routers, health::build_health_check_routers,
    subscription::build_subscription_routers, terms::build_terms_routers,
};

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_book_routers())
        .merge(build_grant_routers())
        .merge(build_terms_routers())
        .merge(build_subscription_routers());

    Router::new().nest("/api/v1", router)
}

// ヘルスチェックはバージョン付きのパスの外に置く
pub fn build_routes() -> Router<AppRegistry> {
    Router::new()
        .merge(build_health_check_routers())
        .merge(routes())
}
