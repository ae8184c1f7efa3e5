//! Lineage Config - 통합 설정
//!
//! 레지스트리, 컨텍스트, 로깅 설정을 하나로 관리하는 LineageConfig

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 설정 파일명
pub const LINEAGE_CONFIG_FILE: &str = "lineage.toml";

/// 설정 디렉토리명 (글로벌: `<config_dir>/lineage`, 프로젝트: `.lineage`)
pub const LINEAGE_CONFIG_DIR: &str = "lineage";

// ============================================================================
// Lineage Config (통합)
// ============================================================================

/// Lineage 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineageConfig {
    /// 레지스트리 설정
    #[serde(default)]
    pub registry: RegistryConfig,

    /// 컨텍스트 설정
    #[serde(default)]
    pub context: ContextConfig,

    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LineageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 파일에서 로드 (확장자로 형식 결정: `.json` / `.toml`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") | None => Self::from_toml_str(&content)?,
            Some(other) => {
                return Err(Error::Configuration(format!(
                    "Unsupported config format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        debug!(path = %path.display(), "Loaded lineage config");
        Ok(config)
    }

    /// 파일에서 로드 (없으면 None)
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// TOML 문자열에서 로드
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// JSON 문자열에서 로드
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 글로벌 + 프로젝트 병합 로드
    pub fn discover() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Some(global) = Self::global_path() {
            if let Some(global_config) = Self::load_optional(global)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Configuration(format!("Cannot get current directory: {}", e)))?;
        if let Some(project_config) = Self::load_optional(Self::project_path(cwd))? {
            config.merge(project_config);
        }

        Ok(config)
    }

    /// 글로벌 설정 경로 (`<config_dir>/lineage/lineage.toml`)
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(LINEAGE_CONFIG_DIR).join(LINEAGE_CONFIG_FILE))
    }

    /// 프로젝트 설정 경로 (`<root>/.lineage/lineage.toml`)
    pub fn project_path(root: impl Into<PathBuf>) -> PathBuf {
        root.into()
            .join(format!(".{}", LINEAGE_CONFIG_DIR))
            .join(LINEAGE_CONFIG_FILE)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정 병합 (기본값이 아닌 값만 덮어씀)
    pub fn merge(&mut self, other: LineageConfig) {
        self.registry.merge(other.registry);
        self.context.merge(other.context);
        self.logging.merge(other.logging);
    }
}

// ============================================================================
// Registry Config
// ============================================================================

/// 레지스트리 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// 같은 이름 재등록 허용 (기본: true, 마지막 등록이 이김)
    #[serde(default = "default_allow_overwrite")]
    pub allow_overwrite: bool,

    /// 이벤트 브로드캐스트 채널 용량
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// 등록되는 정의를 생성 추적 래퍼로 감쌈
    #[serde(default)]
    pub trace_construction: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_overwrite: default_allow_overwrite(),
            event_capacity: default_event_capacity(),
            trace_construction: false,
        }
    }
}

impl RegistryConfig {
    /// 재등록을 에러로 처리하는 설정
    pub fn strict() -> Self {
        Self {
            allow_overwrite: false,
            ..Self::default()
        }
    }

    fn merge(&mut self, other: RegistryConfig) {
        if other.allow_overwrite != default_allow_overwrite() {
            self.allow_overwrite = other.allow_overwrite;
        }
        if other.event_capacity != default_event_capacity() {
            self.event_capacity = other.event_capacity;
        }
        if other.trace_construction {
            self.trace_construction = true;
        }
    }
}

// ============================================================================
// Context Config
// ============================================================================

/// 컨텍스트 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// 컴포넌트 생성 타임아웃 (ms). None이면 무제한 대기
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construct_timeout_ms: Option<u64>,

    /// 같은 (bucket, key)에 대한 동시 생성 요청을 하나로 합침
    #[serde(default = "default_dedupe_in_flight")]
    pub dedupe_in_flight: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            construct_timeout_ms: None,
            dedupe_in_flight: default_dedupe_in_flight(),
        }
    }
}

impl ContextConfig {
    /// 생성 타임아웃 설정
    pub fn with_construct_timeout(mut self, timeout: Duration) -> Self {
        self.construct_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// 동시 생성 합치기 설정
    pub fn with_dedupe_in_flight(mut self, enabled: bool) -> Self {
        self.dedupe_in_flight = enabled;
        self
    }

    /// 생성 타임아웃 (Duration)
    pub fn construct_timeout(&self) -> Option<Duration> {
        self.construct_timeout_ms.map(Duration::from_millis)
    }

    fn merge(&mut self, other: ContextConfig) {
        if other.construct_timeout_ms.is_some() {
            self.construct_timeout_ms = other.construct_timeout_ms;
        }
        if other.dedupe_in_flight != default_dedupe_in_flight() {
            self.dedupe_in_flight = other.dedupe_in_flight;
        }
    }
}

// ============================================================================
// Logging Config
// ============================================================================

/// 로깅 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 기본 로그 레벨 (RUST_LOG가 있으면 무시됨)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 로그에 target 표시
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: false,
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: LoggingConfig) {
        if other.level != default_log_level() {
            self.level = other.level;
        }
        if other.with_target {
            self.with_target = true;
        }
    }
}

// Default value functions
fn default_allow_overwrite() -> bool {
    true
}
fn default_event_capacity() -> usize {
    256
}
fn default_dedupe_in_flight() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LineageConfig::default();
        assert!(config.registry.allow_overwrite);
        assert_eq!(config.registry.event_capacity, 256);
        assert!(!config.registry.trace_construction);
        assert!(config.context.dedupe_in_flight);
        assert_eq!(config.context.construct_timeout(), None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = LineageConfig::from_toml_str(
            r#"
            [registry]
            allow_overwrite = false

            [context]
            construct_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert!(!config.registry.allow_overwrite);
        assert_eq!(config.registry.event_capacity, 256);
        assert_eq!(
            config.context.construct_timeout(),
            Some(Duration::from_millis(250))
        );
        assert!(config.context.dedupe_in_flight);
    }

    #[test]
    fn test_load_json_and_toml_files() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("lineage.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"logging": {{"level": "debug"}}}}"#).unwrap();

        let config = LineageConfig::load(&json_path).unwrap();
        assert_eq!(config.logging.level, "debug");

        let toml_path = dir.path().join("lineage.toml");
        std::fs::write(&toml_path, "[context]\ndedupe_in_flight = false\n").unwrap();

        let config = LineageConfig::load(&toml_path).unwrap();
        assert!(!config.context.dedupe_in_flight);
    }

    #[test]
    fn test_load_optional_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(LineageConfig::load_optional(missing).unwrap().is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.yaml");
        std::fs::write(&path, "registry: {}").unwrap();

        let err = LineageConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_merge_overlays_non_defaults() {
        let mut base = LineageConfig::default();
        base.logging.level = "warn".into();

        let mut project = LineageConfig::default();
        project.context.construct_timeout_ms = Some(100);
        project.registry.allow_overwrite = false;

        base.merge(project);

        assert_eq!(base.logging.level, "warn");
        assert_eq!(base.context.construct_timeout_ms, Some(100));
        assert!(!base.registry.allow_overwrite);
    }

    #[test]
    fn test_project_path() {
        let path = LineageConfig::project_path("/work");
        assert_eq!(path, PathBuf::from("/work/.lineage/lineage.toml"));
    }
}
