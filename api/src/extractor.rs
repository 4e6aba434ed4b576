use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use kernel::model::{
    auth::{AccessToken, Session},
    id::UserId,
    user::Role,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

// リクエストの前処理を実行後、handler に渡す構造体を定義
pub struct AuthorizedUser {
    pub access_token: AccessToken,
    pub session: Session,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.session.user_id
    }

    pub fn is_payment_service(&self) -> bool {
        self.session.role == Role::PaymentService
    }

    // 支払い確定・失敗の通知は決済サービスからのみ受け付ける
    pub fn ensure_payment_service(&self) -> AppResult<()> {
        if self.is_payment_service() {
            Ok(())
        } else {
            Err(AppError::ForbiddenOperation)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppRegistry> for AuthorizedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        // HTTP ヘッダからアクセストークンを取り出す
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::UnauthorizedError)?;
        let access_token = AccessToken(bearer.token().to_string());

        // ユーザ登録は外部の認証サービスの責務。ここではセッションを引くだけ
        let session = registry
            .auth_repository()
            .fetch_session_from_token(&access_token)
            .await?
            .ok_or(AppError::UnauthenticatedError)?;

        Ok(Self {
            access_token,
            session,
        })
    }
}
