//! 환경 변수 기반 설정
//!
//! `.env` 파일이 있으면 먼저 읽는다.

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// 입찰/종료 낙관적 충돌 시 기본 최대 시도 횟수
pub const DEFAULT_BID_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_KAFKA_TOPIC: &str = "auction-events";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// 없으면 메모리 저장소 사용
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_reset: bool,
    pub bind_addr: SocketAddr,
    pub bid_max_attempts: u32,
    /// 없으면 로그 발행자 사용
    pub kafka_brokers: Option<String>,
    pub kafka_topic: String,
}

impl AppConfig {
    /// `.env`와 프로세스 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env가 없는 것은 정상
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 생성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bid_max_attempts = parse_or(&non_empty, "BID_MAX_ATTEMPTS", DEFAULT_BID_MAX_ATTEMPTS)?;
        if bid_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "BID_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_or(
                &non_empty,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            database_reset: parse_or(&non_empty, "DATABASE_RESET", false)?,
            bind_addr: match non_empty("BIND_ADDR") {
                Some(value) => parse("BIND_ADDR", value)?,
                None => parse("BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?,
            },
            bid_max_attempts,
            kafka_brokers: non_empty("KAFKA_BROKERS"),
            kafka_topic: non_empty("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            database_reset: false,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            bid_max_attempts: DEFAULT_BID_MAX_ATTEMPTS,
            kafka_brokers: None,
            kafka_topic: DEFAULT_KAFKA_TOPIC.to_string(),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => parse(key, value),
        None => Ok(default),
    }
}
