//! Memoization - 컨텍스트별 인스턴스 캐시와 메모이즈된 팩토리
//!
//! - `InstanceCache`: 컨텍스트가 소유하는 bucket → key → instance 캐시
//! - `MemoizedFactory`: 생산 함수를 감싸 같은 키에 같은 인스턴스를 돌려줌
//! - `OnceSlot`: 인스턴스 단위 1회 실행

pub mod cache;
pub mod factory;
pub mod once;

pub use cache::{CacheStats, InstanceCache};
pub use factory::{params, CacheScope, FactoryParams, MemoConfig, MemoizedFactory, DEFAULT_KEY_FIELD};
pub use once::OnceSlot;
