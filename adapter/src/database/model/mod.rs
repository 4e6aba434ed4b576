use std::str::FromStr;

use shared::error::{AppError, AppResult};

pub mod auth;
pub mod grant;
pub mod subscription;
pub mod terms;

// 列挙値は小文字の文字列で保存している
pub(crate) fn parse_column<T: FromStr>(value: &str, column: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::ConversionEntityError(format!("unexpected {column}: {value}")))
}
