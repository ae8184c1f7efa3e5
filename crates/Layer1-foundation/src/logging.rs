//! Logging - tracing subscriber 초기화
//!
//! 호스트 애플리케이션이 Lineage 로그를 보고 싶을 때 한 번 호출합니다.
//! `RUST_LOG` 환경 변수가 있으면 설정의 레벨보다 우선합니다.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 로그 필터 생성 (RUST_LOG 우선)
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// 전역 subscriber 설치 (이미 설치되어 있으면 패닉)
pub fn init(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .init();
}

/// 전역 subscriber 설치 (이미 설치되어 있으면 에러 반환)
pub fn try_init(config: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| Error::Configuration(format!("Failed to install subscriber: {}", e)))
}
