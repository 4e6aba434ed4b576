use std::{env, ops::RangeInclusive, str::FromStr};

use anyhow::{ensure, Context, Result};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub rental: RentalConfig,
    pub sweep: SweepConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: env::var("DATABASE_HOST")?,
            port: env::var("DATABASE_PORT")?.parse()?,
            username: env::var("DATABASE_USERNAME")?,
            password: env::var("DATABASE_PASSWORD")?,
            database: env::var("DATABASE_NAME")?,
        };
        let redis = RedisConfig {
            host: env::var("REDIS_HOST")?,
            port: env::var("REDIS_PORT")?.parse()?,
        };
        let rental = RentalConfig {
            digital_rental_days: var_in("RENTAL_DIGITAL_DAYS", 14, RENTAL_DAYS_RANGE)?,
            physical_rental_days: var_in("RENTAL_PHYSICAL_DAYS", 30, RENTAL_DAYS_RANGE)?,
            pending_timeout_minutes: var_in(
                "RENTAL_PENDING_TIMEOUT_MINUTES",
                30,
                PENDING_TIMEOUT_MINUTES_RANGE,
            )?,
        };
        let sweep = SweepConfig {
            interval_seconds: var_or("EXPIRY_SWEEP_INTERVAL_SECONDS", 60)?,
        };
        Ok(Self {
            database,
            redis,
            rental,
            sweep,
        })
    }
}

// 任意項目。未設定ならデフォルト値、設定されていてパースできなければエラー
fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("environment variable {key} is malformed: {v}")),
        Err(_) => Ok(default),
    }
}

// 0 以下だと付与した瞬間に満了し、極端に大きいと日時計算があふれる
const RENTAL_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;
// 最長 1 週間
const PENDING_TIMEOUT_MINUTES_RANGE: RangeInclusive<i64> = 1..=10080;

fn var_in(key: &str, default: i64, range: RangeInclusive<i64>) -> Result<i64> {
    let v = var_or(key, default)?;
    ensure!(
        range.contains(&v),
        "environment variable {key} must be between {} and {}: {v}",
        range.start(),
        range.end()
    );
    Ok(v)
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

/// 貸出期間などのレンタル既定値。
/// 数値はエンジンに埋め込まず、すべてここから渡す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalConfig {
    /// 電子書籍の貸出日数
    pub digital_rental_days: i64,
    /// 紙の本・オーディオブックの貸出日数（配送と返却を含む）
    pub physical_rental_days: i64,
    /// 支払い確認を待つ PENDING 状態の猶予（分）
    pub pending_timeout_minutes: i64,
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            digital_rental_days: 14,
            physical_rental_days: 30,
            pending_timeout_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub interval_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_value_falls_back_to_default() {
        let v: i64 = var_or("RENTAL_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn rental_days_outside_range_are_rejected() {
        for (key, value) in [
            ("RENTAL_TEST_ZERO_DAYS", "0"),
            ("RENTAL_TEST_NEGATIVE_DAYS", "-3"),
            ("RENTAL_TEST_ABSURD_DAYS", "100000"),
        ] {
            env::set_var(key, value);
            let err = var_in(key, 14, RENTAL_DAYS_RANGE).unwrap_err();
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn rental_days_inside_range_are_kept() {
        env::set_var("RENTAL_TEST_WEEK_DAYS", "7");
        assert_eq!(var_in("RENTAL_TEST_WEEK_DAYS", 14, RENTAL_DAYS_RANGE).unwrap(), 7);
        assert_eq!(
            var_in("RENTAL_TEST_UNSET_TIMEOUT", 30, PENDING_TIMEOUT_MINUTES_RANGE).unwrap(),
            30
        );
    }
}
