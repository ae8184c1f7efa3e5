//! Component - 등록 가능한 컴포넌트 정의
//!
//! 레지스트리에는 "어떻게 만드는지"(`ComponentDefinition`)가 등록되고,
//! 호출 시점에 실제 인스턴스(`ComponentInstance`)가 만들어집니다.
//!
//! ## 정의 방법
//!
//! ```ignore
//! // 1. 타입으로 정의
//! struct Logger { scope: Scope, level: String }
//!
//! #[async_trait]
//! impl Subclass for Logger {
//!     const NAME: &'static str = "Logger";
//!     async fn construct(scope: Scope, args: ComponentArgs) -> Result<Self> { ... }
//! }
//! registry.register(definition_of::<Logger>()).await?;
//!
//! // 2. 클로저로 정의
//! let metrics = FnDefinition::new("Metrics", |scope, args| async move { ... });
//! registry.register(Arc::new(metrics)).await?;
//! ```

use crate::context::{Context, ContextRef};
use async_trait::async_trait;
use futures::future::BoxFuture;
use lineage_foundation::{Error, Result};
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// 생성 인자 (호출자가 넘긴 값을 그대로 전달)
pub type ComponentArgs = Vec<Value>;

/// 생성된 컴포넌트 인스턴스
pub type ComponentInstance = Arc<dyn Component>;

/// 레지스트리에 저장되는 정의
pub type DefinitionRef = Arc<dyn ComponentDefinition>;

// ============================================================================
// Component - 생성된 인스턴스
// ============================================================================

/// 다운캐스트 지원
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 컴포넌트 인스턴스 trait
pub trait Component: AsAny {
    /// 이 인스턴스를 만든 정의의 이름
    fn component_name(&self) -> &str;

    /// 바인딩된 컨텍스트 (분리 생성이면 None)
    fn context(&self) -> Option<&ContextRef> {
        None
    }
}

impl dyn Component {
    /// 구체 타입으로 참조
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// 구체 타입의 Arc로 변환
    pub fn downcast_arc<T: Component>(self: Arc<Self>) -> Result<Arc<T>> {
        let name = self.component_name().to_string();
        self.into_any_arc().downcast::<T>().map_err(|_| {
            Error::TypeMismatch(format!(
                "Component '{}' is not a {}",
                name,
                std::any::type_name::<T>()
            ))
        })
    }

    /// 바인딩된 컨텍스트 (살아 있을 때만)
    pub fn owning_context(&self) -> Option<Context> {
        self.context().and_then(ContextRef::upgrade)
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.component_name())
            .field("context", &self.context().map(ContextRef::id))
            .finish()
    }
}

// ============================================================================
// Scope - 생성 범위
// ============================================================================

/// 생성 범위: 컨텍스트에 바인딩되었는지 여부
#[derive(Debug, Clone, Default)]
pub struct Scope {
    context: Option<ContextRef>,
}

impl Scope {
    /// 컨텍스트 없이 생성 (정적 호출)
    pub fn detached() -> Self {
        Self { context: None }
    }

    /// 컨텍스트에 바인딩된 생성
    pub fn bound(context: ContextRef) -> Self {
        Self {
            context: Some(context),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&ContextRef> {
        self.context.as_ref()
    }

    pub fn into_context(self) -> Option<ContextRef> {
        self.context
    }

    /// 바인딩된 컨텍스트 (살아 있을 때만)
    pub fn upgrade(&self) -> Option<Context> {
        self.context.as_ref().and_then(ContextRef::upgrade)
    }
}

// ============================================================================
// ComponentDefinition - 생성 방법
// ============================================================================

/// 컴포넌트 정의 trait
#[async_trait]
pub trait ComponentDefinition: Send + Sync {
    /// 정의 자체의 이름 (기본 등록 키)
    fn name(&self) -> &str;

    /// 카테고리 (그룹화용)
    fn category(&self) -> &str {
        "default"
    }

    /// 인스턴스 생성
    async fn construct(&self, scope: Scope, args: ComponentArgs) -> Result<ComponentInstance>;
}

// ============================================================================
// Subclass - 타입 기반 정의
// ============================================================================

/// 타입 자체를 컴포넌트로 정의
#[async_trait]
pub trait Subclass: Component + Sized {
    /// 기본 등록 이름
    const NAME: &'static str;

    /// 카테고리
    const CATEGORY: &'static str = "default";

    /// 인스턴스 생성
    async fn construct(scope: Scope, args: ComponentArgs) -> Result<Self>;
}

/// `Subclass` 타입의 정의 어댑터
pub struct TypedDefinition<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Subclass> TypedDefinition<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Subclass> Default for TypedDefinition<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Subclass> ComponentDefinition for TypedDefinition<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn category(&self) -> &str {
        T::CATEGORY
    }

    async fn construct(&self, scope: Scope, args: ComponentArgs) -> Result<ComponentInstance> {
        let instance = T::construct(scope, args).await?;
        Ok(Arc::new(instance))
    }
}

/// `Subclass` 타입의 정의 생성
pub fn definition_of<T: Subclass>() -> DefinitionRef {
    Arc::new(TypedDefinition::<T>::new())
}

// ============================================================================
// FnDefinition - 클로저 기반 정의
// ============================================================================

type ConstructFn =
    dyn Fn(Scope, ComponentArgs) -> BoxFuture<'static, Result<ComponentInstance>> + Send + Sync;

/// 클로저 기반 정의
pub struct FnDefinition {
    name: String,
    category: String,
    construct: Arc<ConstructFn>,
}

impl FnDefinition {
    pub fn new<F, Fut>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(Scope, ComponentArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ComponentInstance>> + Send + 'static,
    {
        Self {
            name: name.into(),
            category: "default".to_string(),
            construct: Arc::new(
                move |scope: Scope, args: ComponentArgs| -> BoxFuture<'static, Result<ComponentInstance>> {
                    Box::pin(construct(scope, args))
                },
            ),
        }
    }

    /// 카테고리 설정
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn into_ref(self) -> DefinitionRef {
        Arc::new(self)
    }
}

#[async_trait]
impl ComponentDefinition for FnDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    async fn construct(&self, scope: Scope, args: ComponentArgs) -> Result<ComponentInstance> {
        (self.construct)(scope, args).await
    }
}

impl std::fmt::Debug for FnDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

// ============================================================================
// TracedDefinition - 생성 추적 래퍼
// ============================================================================

/// 생성 시간과 결과를 로그로 남기는 래퍼
pub struct TracedDefinition {
    inner: DefinitionRef,
}

impl TracedDefinition {
    pub fn wrap(inner: DefinitionRef) -> DefinitionRef {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl ComponentDefinition for TracedDefinition {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn category(&self) -> &str {
        self.inner.category()
    }

    async fn construct(&self, scope: Scope, args: ComponentArgs) -> Result<ComponentInstance> {
        let start = Instant::now();
        let bound = scope.is_bound();
        let result = self.inner.construct(scope, args).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(component = self.name(), bound, elapsed_ms, "Constructed"),
            Err(e) => warn!(component = self.name(), bound, elapsed_ms, error = %e, "Construction failed"),
        }
        result
    }
}
