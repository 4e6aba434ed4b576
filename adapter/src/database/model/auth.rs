use kernel::model::{
    auth::{AccessToken, Session},
    id::UserId,
    user::Role,
};
use shared::error::AppError;

use crate::redis::model::{RedisKey, RedisValue};

pub struct AuthorizationKey(String);

// 認証サービスが "<role>:<user_id>" の形で書き込む
#[derive(Debug)]
pub struct AuthorizedSession(Session);

impl From<&AccessToken> for AuthorizationKey {
    fn from(token: &AccessToken) -> Self {
        Self(format!("session:{}", token.0))
    }
}

impl RedisKey for AuthorizationKey {
    type Value = AuthorizedSession;

    fn inner(&self) -> String {
        self.0.clone()
    }
}

impl AuthorizedSession {
    pub fn into_inner(self) -> Session {
        self.0
    }
}

impl RedisValue for AuthorizedSession {
    fn inner(&self) -> String {
        format!("{}:{}", self.0.role.as_ref(), self.0.user_id)
    }
}

impl TryFrom<String> for AuthorizedSession {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let (role, user_id) = s.split_once(':').ok_or_else(|| {
            AppError::ConversionEntityError(format!("malformed session value: {s}"))
        })?;
        let role: Role = role
            .parse()
            .map_err(|_| AppError::ConversionEntityError(format!("unknown role: {role}")))?;
        let user_id: UserId = user_id.parse()?;
        Ok(Self(Session { user_id, role }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_value_round_trips_through_the_stored_format() {
        let user_id = UserId::new();
        let stored = format!("payment_service:{user_id}");

        let session = AuthorizedSession::try_from(stored.clone()).unwrap();

        assert_eq!(session.inner(), stored);
        assert_eq!(session.into_inner().role, Role::PaymentService);
    }

    #[test]
    fn rejects_unknown_roles_and_garbage() {
        assert!(AuthorizedSession::try_from("admin:not-a-uuid".to_string()).is_err());
        assert!(AuthorizedSession::try_from("no-separator".to_string()).is_err());
    }

    #[test]
    fn keys_are_namespaced() {
        let key = AuthorizationKey::from(&AccessToken("abc".into()));
        assert_eq!(key.inner(), "session:abc");
    }
}
