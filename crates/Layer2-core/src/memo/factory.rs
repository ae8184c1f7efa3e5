//! Memoized Factory - 컨텍스트별 인스턴스 메모이제이션
//!
//! 생산 함수를 감싸서, 같은 컨텍스트에서 같은 키로 호출하면 처음 만든
//! 인스턴스를 그대로 돌려줍니다. 캐시는 컨텍스트가 소유하므로 다른
//! 컨텍스트끼리는 인스턴스를 공유하지 않습니다.
//!
//! ```ignore
//! let logger_for = MemoizedFactory::wrap(
//!     |ctx: Context, params| async move { ctx.call_component("Logger", vec![params["key"].clone()]).await },
//!     MemoConfig::new("loggers"),
//! );
//!
//! let a = logger_for.call(&ctx, params(json!({"key": "db"}))).await?;
//! let b = logger_for.call(&ctx, params(json!({"key": "db"}))).await?;
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use super::cache::InstanceCache;
use crate::component::ComponentInstance;
use crate::context::bounded;
use futures::future::BoxFuture;
use lineage_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// 기본 캐시 키 필드
pub const DEFAULT_KEY_FIELD: &str = "key";

/// 팩토리 호출 파라미터
pub type FactoryParams = Map<String, Value>;

// ============================================================================
// CacheScope - 캐시를 가진 호출 대상
// ============================================================================

/// 메모이제이션 캐시를 제공하는 대상 (컨텍스트 또는 바인딩된 컴포넌트)
pub trait CacheScope: Clone + Send + Sync + 'static {
    /// 이 대상이 소유한 캐시
    fn instance_cache(&self) -> Result<Arc<InstanceCache>>;

    /// 생성 타임아웃
    fn construct_timeout(&self) -> Option<Duration> {
        None
    }
}

// ============================================================================
// MemoConfig
// ============================================================================

/// 메모이제이션 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoConfig {
    /// 캐시 버킷 이름
    pub bucket: String,

    /// 파라미터에서 캐시 키로 쓸 필드
    #[serde(default = "default_key_field")]
    pub key_field: String,
}

impl MemoConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_field: default_key_field(),
        }
    }

    /// 키 필드 설정
    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }
}

fn default_key_field() -> String {
    DEFAULT_KEY_FIELD.to_string()
}

// ============================================================================
// MemoizedFactory
// ============================================================================

type ProduceFn<S> =
    dyn Fn(S, FactoryParams) -> BoxFuture<'static, Result<ComponentInstance>> + Send + Sync;

/// 메모이즈된 팩토리 메서드
pub struct MemoizedFactory<S> {
    config: MemoConfig,
    produce: Arc<ProduceFn<S>>,
}

impl<S> Clone for MemoizedFactory<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            produce: Arc::clone(&self.produce),
        }
    }
}

impl<S: CacheScope> MemoizedFactory<S> {
    /// 생산 함수를 감쌈
    pub fn wrap<F, Fut>(produce: F, config: MemoConfig) -> Self
    where
        F: Fn(S, FactoryParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ComponentInstance>> + Send + 'static,
    {
        Self {
            config,
            produce: Arc::new(
                move |scope: S, params: FactoryParams| -> BoxFuture<'static, Result<ComponentInstance>> {
                    Box::pin(produce(scope, params))
                },
            ),
        }
    }

    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// 호출: 캐시에 있으면 그대로, 없으면 생산 후 저장
    pub async fn call(&self, scope: &S, params: FactoryParams) -> Result<ComponentInstance> {
        // 키 검증이 캐시 접근보다 먼저
        let key = cache_key(&params, &self.config.key_field)?;
        let cache = scope.instance_cache()?;
        let bucket = self.config.bucket.as_str();
        let timeout = scope.construct_timeout();
        let label = format!("{}[{}]", bucket, key);

        if cache.dedupe_in_flight() {
            let slot = cache.slot(bucket, &key);
            if let Some(hit) = slot.get() {
                cache.record_hit();
                trace!(bucket, key = %key, "Memo hit");
                return Ok(Arc::clone(hit));
            }

            let mut constructed = false;
            let instance = slot
                .get_or_try_init(|| {
                    constructed = true;
                    cache.record_miss();
                    bounded(timeout, &label, (self.produce)(scope.clone(), params))
                })
                .await?;

            if constructed {
                cache.record_construction();
                debug!(bucket, key = %key, "Memo stored");
            } else {
                // 다른 호출이 만든 결과를 기다려 받음
                cache.record_hit();
                trace!(bucket, key = %key, "Memo joined in-flight construction");
            }
            return Ok(Arc::clone(instance));
        }

        if let Some(hit) = cache.get(bucket, &key) {
            cache.record_hit();
            trace!(bucket, key = %key, "Memo hit");
            return Ok(hit);
        }

        cache.record_miss();
        let instance = bounded(timeout, &label, (self.produce)(scope.clone(), params)).await?;
        cache.record_construction();
        cache.store(bucket, &key, Arc::clone(&instance));
        debug!(bucket, key = %key, "Memo stored (last write wins)");
        Ok(instance)
    }
}

impl<S> std::fmt::Debug for MemoizedFactory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedFactory")
            .field("config", &self.config)
            .finish()
    }
}

/// 파라미터에서 캐시 키 추출 (문자열은 그대로, 나머지 값은 JSON 표기)
fn cache_key(params: &FactoryParams, key_field: &str) -> Result<String> {
    match params.get(key_field) {
        None => Err(Error::Configuration(format!(
            "Missing cache key field '{}' in factory params",
            key_field
        ))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

/// JSON 객체를 팩토리 파라미터로 변환
pub fn params(value: Value) -> FactoryParams {
    match value {
        Value::Object(map) => map,
        Value::Null => FactoryParams::new(),
        other => {
            let mut map = FactoryParams::new();
            map.insert(DEFAULT_KEY_FIELD.to_string(), other);
            map
        }
    }
}
