use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::id::{BookId, GrantId};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::grant::{CreateGrantRequest, GrantResponse, GrantsResponse},
};

pub async fn create_rental(
    user: AuthorizedUser,
    Path(book_id): Path<BookId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateGrantRequest>,
) -> AppResult<(StatusCode, Json<GrantResponse>)> {
    req.validate()?;

    registry
        .entitlement_resolver()
        .create_rental(user.id(), book_id, req.format, req.order_item_id, Utc::now())
        .await
        .map(|grant| (StatusCode::CREATED, Json(grant.into())))
}

pub async fn create_purchase(
    user: AuthorizedUser,
    Path(book_id): Path<BookId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateGrantRequest>,
) -> AppResult<(StatusCode, Json<GrantResponse>)> {
    req.validate()?;

    registry
        .entitlement_resolver()
        .create_purchase(user.id(), book_id, req.format, req.order_item_id, Utc::now())
        .await
        .map(|grant| (StatusCode::CREATED, Json(grant.into())))
}

pub async fn show_grant_list(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<GrantsResponse>> {
    registry
        .entitlement_resolver()
        .list_user_grants(user.id())
        .await
        .map(GrantsResponse::from)
        .map(Json)
}

pub async fn return_rental(
    user: AuthorizedUser,
    Path(grant_id): Path<GrantId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<GrantResponse>> {
    let resolver = registry.entitlement_resolver();

    // 他人の貸出は返却できない
    let grant = resolver.find_grant(grant_id).await?;
    if grant.user_id != user.id() {
        return Err(AppError::ForbiddenOperation);
    }

    resolver
        .return_rental(grant_id, Utc::now())
        .await
        .map(GrantResponse::from)
        .map(Json)
}

pub async fn activate_grant(
    user: AuthorizedUser,
    Path(grant_id): Path<GrantId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<GrantResponse>> {
    user.ensure_payment_service()?;

    registry
        .entitlement_resolver()
        .activate_grant(grant_id, Utc::now())
        .await
        .map(GrantResponse::from)
        .map(Json)
}

pub async fn cancel_grant(
    user: AuthorizedUser,
    Path(grant_id): Path<GrantId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<GrantResponse>> {
    user.ensure_payment_service()?;

    registry
        .entitlement_resolver()
        .cancel_grant(grant_id, Utc::now())
        .await
        .map(GrantResponse::from)
        .map(Json)
}
