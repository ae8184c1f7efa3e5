//! # Component Registry
//!
//! 이름 → 컴포넌트 정의 레지스트리
//!
//! ## 개요
//!
//! 확장 지점(`ExtensionPoint`)마다 하나의 레지스트리를 가지며, 정의는 런타임에
//! 즉시 등록하거나(`register`) 지연 등록 후 한 번에 커밋(`register_deferred` +
//! `commit`)할 수 있습니다.
//!
//! ## 설계 원칙
//!
//! 1. **Interior Mutability**: RwLock을 사용하여 Arc 내부에서도 변경 가능
//! 2. **Last write wins**: 같은 이름 재등록은 교체 (strict 설정 시 에러)
//! 3. **Event-driven**: 변경 시 이벤트 발행으로 리스너에게 통보
//! 4. **Snapshot**: 컨텍스트는 생성 시점의 스냅샷으로 조립
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ComponentRegistry                           │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │  RwLock<HashMap<String, RegistryEntry>>                 ││
//! │  │  ┌──────────┬──────────┬──────────┬──────────┐         ││
//! │  │  │ Logger   │ Metrics  │ Cache    │ ...      │         ││
//! │  │  └──────────┴──────────┴──────────┴──────────┘         ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │        ▲ commit()                         │ snapshot()       │
//! │  ┌─────┴──────────────────┐        ┌──────▼─────────────┐   │
//! │  │ EventedChannel         │        │ RegistrySnapshot   │   │
//! │  │ (deferred, once)       │        │ → ContextFactory   │   │
//! │  └────────────────────────┘        └────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용 예시
//!
//! ```ignore
//! let registry = ComponentRegistry::new("services");
//!
//! registry.register(definition_of::<Logger>()).await?;
//! registry.register_deferred(definition_of::<Metrics>()).await?;
//!
//! let report = registry.commit().await;
//! assert!(report.is_success());
//!
//! let mut rx = registry.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     match event {
//!         RegistryEvent::Registered { key, .. } => println!("Added: {}", key),
//!         RegistryEvent::Replaced { key, .. } => println!("Replaced: {}", key),
//!         _ => {}
//!     }
//! }
//! ```

mod deferred;
mod dynamic;
mod entry;
mod snapshot;
mod traits;

pub use deferred::{CommitOutcome, CommitReport};
pub use dynamic::{ComponentRegistry, RegistryStats};
pub use entry::{EntryMetadata, RegistryEntry};
pub use snapshot::{RegistrySnapshot, SnapshotInfo};
pub use traits::{RegistryEvent, RegistryEventHandler};
