use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::auth::{AccessToken, Session},
    repository::auth::AuthRepository,
};
use shared::error::AppResult;

use crate::{
    database::model::auth::{AuthorizationKey, AuthorizedSession},
    redis::RedisClient,
};

#[derive(new)]
pub struct AuthRepositoryImpl {
    kv: Arc<RedisClient>,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_session_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<Session>> {
        let key: AuthorizationKey = access_token.into();
        self.kv
            .get(&key)
            .await
            .map(|x| x.map(AuthorizedSession::into_inner))
    }
}
