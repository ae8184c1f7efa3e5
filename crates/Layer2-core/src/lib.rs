//! lineage-core: Core Runtime for Lineage
//!
//! Layer2 - 컴포넌트 레지스트리 / 컨텍스트 / 메모이제이션 레이어
//!
//! # 주요 모듈
//!
//! - `component`: 컴포넌트 정의와 인스턴스 trait (`Subclass`, `FnDefinition`)
//! - `registry`: 이름 → 정의 레지스트리 (즉시 / 지연 등록, 스냅샷, 이벤트)
//! - `binding`: 정의를 컨텍스트에 묶는 위임 래퍼 (`BoundComponent`)
//! - `context`: 공유 상태 + 바인딩된 컴포넌트 + 인스턴스 캐시 (`Context`)
//! - `memo`: 컨텍스트별 메모이즈된 팩토리 (`MemoizedFactory`, `OnceSlot`)
//! - `extension`: 위 요소를 묶은 기반 컴포넌트 (`ExtensionPoint`)
//!
//! # 사용 예시
//!
//! ```ignore
//! use lineage_core::{definition_of, ExtensionPoint, MemoConfig, MemoizedFactory, SharedState};
//!
//! let services = ExtensionPoint::new("services");
//! services.register(definition_of::<Logger>()).await?;
//! services.extend(definition_of::<Metrics>()).await?;
//! services.commit().await.into_result()?;
//!
//! // 컨텍스트 생성
//! let ctx = services
//!     .create_context(SharedState::new().with("env", "prod"))
//!     .await;
//!
//! // 컨텍스트에 바인딩된 생성
//! let logger = ctx.call_component("Logger", vec![json!("info")]).await?;
//!
//! // 같은 키 → 같은 인스턴스
//! let metrics_for = MemoizedFactory::wrap(
//!     |ctx: Context, params| async move { ctx.call_component("Metrics", vec![Value::Object(params)]).await },
//!     MemoConfig::new("metrics"),
//! );
//! let m = metrics_for.call(&ctx, params(json!({"key": "db"}))).await?;
//! ```

pub mod binding;
pub mod component;
pub mod context;
pub mod extension;
pub mod memo;
pub mod registry;

// Re-exports: Component
pub use component::{
    definition_of, AsAny, Component, ComponentArgs, ComponentDefinition, ComponentInstance,
    DefinitionRef, FnDefinition, Scope, Subclass, TracedDefinition, TypedDefinition,
};

// Re-exports: Registry
pub use registry::{
    CommitOutcome, CommitReport, ComponentRegistry, EntryMetadata, RegistryEntry, RegistryEvent,
    RegistryEventHandler, RegistrySnapshot, RegistryStats, SnapshotInfo,
};

// Re-exports: Binding / Context
pub use binding::BoundComponent;
pub use context::{Context, ContextFactory, ContextId, ContextRef, SharedState};

// Re-exports: Memoization
pub use memo::{
    params, CacheScope, CacheStats, FactoryParams, InstanceCache, MemoConfig, MemoizedFactory,
    OnceSlot, DEFAULT_KEY_FIELD,
};

// Re-exports: Extension Point
pub use extension::{ExtensionPoint, ExtensionPointBuilder};

// Re-exports: Layer1 (foundation)
pub use lineage_foundation::{
    apply_if, AttachTo, ContextConfig, Error, LineageConfig, LoggingConfig, MemberTable,
    RegistryConfig, Result,
};
