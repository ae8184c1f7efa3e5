//! # lineage-foundation
//!
//! Foundation layer for Lineage:
//! - Error: 공통 에러 타입 (NotFound, Configuration, ...)
//! - Config: 통합 설정 (LineageConfig - registry / context / logging)
//! - Logging: tracing subscriber 초기화
//! - Event: 지연 등록용 "모두 완료" 채널 (EventedChannel)
//! - Decorator / Middleware: 범용 조합 도구
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  lineage-core (Registry / Context / Memoization)        │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  ┌──────────────┬──────────────┬──────────────────┐    │
//! │  │ EventedChannel│ LineageConfig│ Decorator/Middle │    │
//! │  │ (deferred)   │ (serde)      │ (collaborators)  │    │
//! │  └──────────────┴──────────────┴──────────────────┘    │
//! │                     │                                   │
//! │          Error / Result (thiserror) · tracing           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod decorator;
pub mod error;
pub mod event;
pub mod logging;
pub mod middleware;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ContextConfig, LineageConfig, LoggingConfig, RegistryConfig, LINEAGE_CONFIG_DIR,
    LINEAGE_CONFIG_FILE,
};

// ============================================================================
// Event (등록 채널)
// ============================================================================
pub use event::{ChannelListener, EmissionReport, EventedChannel, ListenerId, ListenerOutcome};

// ============================================================================
// Decorator / Middleware (범용 조합 도구)
// ============================================================================
pub use decorator::{apply_if, AttachTo, Member, MemberTable};
pub use middleware::{wrap_middleware, Middleware, MiddlewareChain, Next};
