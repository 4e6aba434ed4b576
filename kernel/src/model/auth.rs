use super::{id::UserId, user::Role};

pub struct AccessToken(pub String);

// 外部の認証サービスがセッションストアに書き込んだ内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}
