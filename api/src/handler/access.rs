use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use kernel::model::{book::BookFormat, id::BookId};
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUser,
    model::access::{AccessResponse, AvailabilityResponse, RecommendationResponse},
};

pub async fn show_access(
    user: AuthorizedUser,
    Path(book_id): Path<BookId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AccessResponse>> {
    registry
        .entitlement_resolver()
        .get_access(user.id(), book_id, Utc::now())
        .await
        .map(AccessResponse::from)
        .map(Json)
}

// 表示用の参考値。貸出の可否は登録時に改めて判定される
pub async fn show_availability(
    _user: AuthorizedUser,
    Path((book_id, format)): Path<(BookId, BookFormat)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailabilityResponse>> {
    registry
        .availability_tracker()
        .get_availability(book_id, format, Utc::now())
        .await
        .map(AvailabilityResponse::from)
        .map(Json)
}

pub async fn show_recommendation(
    _user: AuthorizedUser,
    Path(book_id): Path<BookId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RecommendationResponse>> {
    registry
        .entitlement_resolver()
        .recommend_rental_type(book_id, Utc::now())
        .await
        .map(|recommendation| RecommendationResponse::new(book_id, recommendation))
        .map(Json)
}
