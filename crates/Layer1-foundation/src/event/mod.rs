//! Event System - 등록 채널
//!
//! 지연 등록(two-phase registration)에 쓰이는 "모두 완료" 방식의 채널입니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EventedChannel<E>                        │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │  emit(&event) ── join_all ──────────────────────────┐ │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │         │                                                   │
//! │         ▼                                                   │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
//! │  │  Listener 1  │  │  Listener 2  │  │  Listener N  │      │
//! │  │  (deferred)  │  │  (deferred)  │  │  (custom)    │      │
//! │  └──────────────┘  └──────────────┘  └──────────────┘      │
//! │         │                 │                 │               │
//! │         └────────── EmissionReport ─────────┘               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod channel;

pub use channel::{
    ChannelListener, EmissionReport, EventedChannel, ListenerId, ListenerOutcome,
};
