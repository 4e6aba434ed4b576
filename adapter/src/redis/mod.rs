pub mod model;

use redis::{AsyncCommands, Client};
use shared::{config::RedisConfig, error::AppResult};

use self::model::RedisKey;

pub struct RedisClient {
    client: Client,
}

impl RedisClient {
    pub fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(format!("redis://{}:{}", config.host, config.port))?;
        Ok(Self { client })
    }

    pub async fn get<T: RedisKey>(&self, key: &T) -> AppResult<Option<T::Value>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: Option<String> = conn.get(key.inner()).await?;
        result.map(T::Value::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::model::auth::AuthorizationKey;
    use kernel::model::auth::AccessToken;

    fn local() -> RedisConfig {
        RedisConfig {
            host: "localhost".into(),
            port: 6379,
        }
    }

    // Client::open は URL を検証するだけで接続しない
    #[test]
    fn client_is_built_without_connecting() {
        assert!(RedisClient::new(&local()).is_ok());
    }

    #[tokio::test]
    #[ignore]
    async fn unknown_session_reads_as_none() -> anyhow::Result<()> {
        let client = RedisClient::new(&local())?;
        let key = AuthorizationKey::from(&AccessToken("never-issued".into()));
        assert!(client.get(&key).await?.is_none());
        Ok(())
    }
}
