use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUser,
    model::terms::{
        AcceptTermsRequest, TermsAcceptanceResponse, TermsCategoryQuery, TermsValidationResponse,
    },
};

// 未同意でも 200 で返し、必要な版を本文に載せる
pub async fn validate_terms(
    user: AuthorizedUser,
    Query(query): Query<TermsCategoryQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<TermsValidationResponse>> {
    registry
        .terms_gate()
        .validate(user.id(), query.into())
        .await
        .map(TermsValidationResponse::from)
        .map(Json)
}

pub async fn accept_terms(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<AcceptTermsRequest>,
) -> AppResult<(StatusCode, Json<TermsAcceptanceResponse>)> {
    req.validate()?;

    registry
        .terms_gate()
        .accept(req.into_event(user.id(), Utc::now()))
        .await
        .map(|acceptance| (StatusCode::CREATED, Json(acceptance.into())))
}
