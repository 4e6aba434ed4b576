use std::collections::HashMap;

use async_trait::async_trait;
use kernel::{
    model::auth::{AccessToken, Session},
    repository::auth::AuthRepository,
};
use shared::error::AppResult;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryAuthRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemoryAuthRepository {
    pub async fn insert_session(&self, token: &str, session: Session) {
        self.sessions
            .write()
            .await
            .insert(token.to_string(), session);
    }
}

#[async_trait]
impl AuthRepository for InMemoryAuthRepository {
    async fn fetch_session_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&access_token.0).cloned())
    }
}
