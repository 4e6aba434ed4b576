use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    // 在庫の取り合いや二重貸出に負けた。呼び出し側で再取得するか売り切れとして扱う
    #[error("{0}")]
    Conflict(String),
    #[error("{from} から {to} へは遷移できません")]
    InvalidTransition { from: String, to: String },
    #[error("{category} の利用規約 {terms_version} への同意が必要です")]
    TermsRequired {
        terms_version: String,
        category: String,
    },
    // sqlx::Errorを引数にするヴァリアントが複数あるので、[from]は使えず、[source]で代用している
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("Not rows affected: {0}")]
    NoRowAffectedError(String),
    #[error("{0}")]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("認可情報が間違っています")]
    UnauthorizedError,
    #[error("許可されていない操作です")]
    ForbiddenOperation,
    #[error("{0}")]
    ConversionEntityError(String),
}

impl AppError {
    pub fn conflict_unavailable() -> Self {
        Self::Conflict("この書籍は指定された形式ではもう利用できません".into())
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::UnprocessableEntity(_) => "unprocessable_entity",
            AppError::EntityNotFound(_) => "not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::TermsRequired { .. } => "terms_required",
            AppError::ConvertToUuidError(_) => "bad_request",
            AppError::UnauthenticatedError => "unauthenticated",
            AppError::UnauthorizedError => "unauthorized",
            AppError::ForbiddenOperation => "forbidden",
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::ConversionEntityError(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    terms_required: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match &self {
            AppError::UnprocessableEntity(_) | AppError::InvalidTransition { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::ConvertToUuidError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnauthenticatedError
            | AppError::ForbiddenOperation
            | AppError::TermsRequired { .. } => StatusCode::FORBIDDEN,
            AppError::UnauthorizedError => StatusCode::UNAUTHORIZED,
            e @ (AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::ConversionEntityError(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // 内部エラーの詳細はレスポンスに載せない
        let message = if status_code.is_server_error() {
            "サーバ内部でエラーが発生しました".to_string()
        } else {
            self.to_string()
        };
        let terms_required = match &self {
            AppError::TermsRequired { terms_version, .. } => Some(terms_version.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            code: self.code(),
            message,
            terms_required,
        };
        (status_code, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
