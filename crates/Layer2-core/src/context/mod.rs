//! Context - 공유 상태와 바인딩된 컴포넌트를 가진 실행 컨텍스트
//!
//! 컨텍스트는 생성 시점의 레지스트리 스냅샷으로 만들어지며, 등록된 모든
//! 정의를 자신에게 바인딩한 `BoundComponent`를 이름으로 찾을 수 있습니다.
//! 메모이즈된 팩토리의 캐시도 컨텍스트가 소유합니다.
//!
//! ## 구조
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Context (Arc<ContextInner>)                               │
//! │  ├─ id / created_at                                       │
//! │  ├─ shared_state  (생성 시 넘긴 파라미터)                 │
//! │  ├─ bound         name → BoundComponent ──┐               │
//! │  └─ cache         bucket → key → instance │               │
//! │                         │                  │               │
//! │                         ▼                  ▼               │
//! │                 instance.context() ── ContextRef (Weak) ──┘
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! 인스턴스와 바인딩은 `ContextRef`(약한 참조)로만 컨텍스트를 가리키므로
//! 캐시된 인스턴스가 컨텍스트를 붙잡아 순환이 생기지 않습니다.

mod factory;
mod shared_state;

pub use factory::ContextFactory;
pub use shared_state::SharedState;

use crate::binding::BoundComponent;
use crate::component::{ComponentArgs, ComponentInstance, DefinitionRef};
use crate::memo::{CacheScope, InstanceCache};
use crate::registry::RegistrySnapshot;
use chrono::{DateTime, Utc};
use lineage_foundation::{ContextConfig, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

// ============================================================================
// ContextId
// ============================================================================

/// 컨텍스트 고유 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

// ============================================================================
// ContextRef - 약한 역참조
// ============================================================================

/// 컨텍스트 약한 참조 (인스턴스 → 컨텍스트)
#[derive(Clone)]
pub struct ContextRef {
    id: ContextId,
    inner: Weak<ContextInner>,
}

impl ContextRef {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// 컨텍스트가 살아 있으면 강한 참조 반환
    pub fn upgrade(&self) -> Option<Context> {
        self.inner.upgrade().map(|inner| Context { inner })
    }

    /// 컨텍스트가 살아 있어야 하는 경우
    pub fn require(&self) -> Result<Context> {
        self.upgrade()
            .ok_or_else(|| Error::ContextReleased(self.id.to_string()))
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl PartialEq for ContextRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContextRef {}

impl PartialEq<Context> for ContextRef {
    fn eq(&self, other: &Context) -> bool {
        self.id == other.id()
    }
}

impl std::fmt::Debug for ContextRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl CacheScope for ContextRef {
    fn instance_cache(&self) -> Result<Arc<InstanceCache>> {
        self.require()?.instance_cache()
    }

    fn construct_timeout(&self) -> Option<Duration> {
        self.upgrade()
            .and_then(|context| context.config().construct_timeout())
    }
}

// ============================================================================
// Context
// ============================================================================

struct ContextInner {
    id: ContextId,
    created_at: DateTime<Utc>,
    shared_state: SharedState,
    bound: HashMap<String, BoundComponent>,
    cache: Arc<InstanceCache>,
    /// 이 컨텍스트를 만든 팩토리 (형제 컨텍스트 생성 / 멤버 / 설정)
    factory: ContextFactory,
}

/// 실행 컨텍스트 (복제는 같은 컨텍스트를 가리킴)
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// 스냅샷의 모든 정의를 바인딩한 컨텍스트 조립
    pub(crate) fn assemble(
        factory: ContextFactory,
        snapshot: &RegistrySnapshot,
        shared_state: SharedState,
    ) -> Self {
        let id = ContextId::new();
        let cache = Arc::new(InstanceCache::new(factory.config().dedupe_in_flight));

        let inner = Arc::new_cyclic(|weak: &Weak<ContextInner>| {
            let context_ref = ContextRef {
                id,
                inner: weak.clone(),
            };
            let bound = snapshot
                .iter()
                .map(|(name, definition)| {
                    let bound = BoundComponent::bind(Arc::clone(definition), context_ref.clone());
                    (name.clone(), bound)
                })
                .collect();

            ContextInner {
                id,
                created_at: Utc::now(),
                shared_state,
                bound,
                cache,
                factory,
            }
        });

        debug!(
            context = %id,
            registry = snapshot.registry(),
            components = inner.bound.len(),
            "Context created"
        );

        Self { inner }
    }

    // ========================================================================
    // 기본 정보
    // ========================================================================

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// 약한 참조 생성
    pub fn context_ref(&self) -> ContextRef {
        ContextRef {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.inner.shared_state
    }

    pub fn config(&self) -> &ContextConfig {
        self.inner.factory.config()
    }

    /// 이 컨텍스트의 인스턴스 캐시
    pub fn cache(&self) -> &Arc<InstanceCache> {
        &self.inner.cache
    }

    // ========================================================================
    // 바인딩된 컴포넌트
    // ========================================================================

    /// 바인딩된 컴포넌트 이름 (정렬)
    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.bound.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains_component(&self, name: &str) -> bool {
        self.inner.bound.contains_key(name)
    }

    pub fn bound_component(&self, name: &str) -> Option<&BoundComponent> {
        self.inner.bound.get(name)
    }

    /// 바인딩의 원본 (공유) 정의
    pub fn get_component(&self, name: &str) -> Option<DefinitionRef> {
        self.inner
            .bound
            .get(name)
            .map(|bound| Arc::clone(bound.definition()))
    }

    /// 이름으로 컴포넌트 생성 (이 컨텍스트를 스코프로)
    ///
    /// 생성 결과는 캐시되지 않습니다. 캐시는 `MemoizedFactory`를 통해서만 채워집니다.
    pub async fn call_component(
        &self,
        name: &str,
        args: ComponentArgs,
    ) -> Result<ComponentInstance> {
        let bound = self.inner.bound.get(name).ok_or_else(|| {
            Error::NotFound(format!("Component '{}' in context {}", name, self.inner.id))
        })?;

        trace!(context = %self.inner.id, component = name, "Calling component");
        bounded(self.config().construct_timeout(), name, bound.construct(args)).await
    }

    // ========================================================================
    // 형제 컨텍스트 / 멤버
    // ========================================================================

    /// 같은 팩토리로 새 컨텍스트 생성 (현재 레지스트리 기준)
    pub async fn create_context(&self, shared_state: impl Into<SharedState>) -> Context {
        self.inner.factory.create_context(shared_state).await
    }

    /// 인스턴스 멤버 호출
    pub fn call_member(&self, name: &str, input: Value) -> Result<Value> {
        self.inner.factory.members().call(self, name, input)
    }

    pub fn member_names(&self) -> Vec<String> {
        self.inner.factory.members().names()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl PartialEq<ContextRef> for Context {
    fn eq(&self, other: &ContextRef) -> bool {
        self.inner.id == other.id
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("components", &self.component_names())
            .field("shared_state", &self.inner.shared_state)
            .finish()
    }
}

impl CacheScope for Context {
    fn instance_cache(&self) -> Result<Arc<InstanceCache>> {
        Ok(Arc::clone(&self.inner.cache))
    }

    fn construct_timeout(&self) -> Option<Duration> {
        self.config().construct_timeout()
    }
}

/// 생성 타임아웃 적용 (None이면 그대로 대기)
pub(crate) async fn bounded<T, F>(timeout: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            Error::Timeout(format!(
                "Constructing '{}' exceeded {}ms",
                what,
                limit.as_millis()
            ))
        })?,
        None => fut.await,
    }
}
