use std::env;

use strum::EnumString;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

// 環境変数 ENV から実行環境を判定する。未設定・不正値ならビルドプロファイルで決める
pub fn which() -> Environment {
    #[cfg(debug_assertions)]
    let default_env = Environment::Development;
    #[cfg(not(debug_assertions))]
    let default_env = Environment::Production;

    match env::var("ENV") {
        Err(_) => default_env,
        Ok(v) => v.parse().unwrap_or(default_env),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_names() {
        assert_eq!(
            "production".parse::<Environment>().ok(),
            Some(Environment::Production)
        );
        assert_eq!(
            "development".parse::<Environment>().ok(),
            Some(Environment::Development)
        );
        assert!("staging".parse::<Environment>().is_err());
    }
}
