use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::auth::{AccessToken, Session};

// セッションの発行は外部の認証サービスが行う。ここではトークンの解決のみ
#[mockall::automock]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn fetch_session_from_token(&self, access_token: &AccessToken)
        -> AppResult<Option<Session>>;
}
