use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use garde::Validate;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUser,
    model::subscription::{CreateSubscriptionRequest, SubscriptionResponse},
};

// 購読は支払いと引き換えなので、会員からは直接登録させない
pub async fn create_subscription(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> AppResult<(StatusCode, Json<SubscriptionResponse>)> {
    user.ensure_payment_service()?;
    req.validate()?;

    registry
        .entitlement_resolver()
        .subscribe(req.into_event(Utc::now()))
        .await
        .map(|subscription| (StatusCode::CREATED, Json(subscription.into())))
}
