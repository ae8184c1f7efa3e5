//! Registry Traits - 레지스트리 이벤트와 핸들러

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// RegistryEvent - 레지스트리 변경 이벤트
// ============================================================================

/// 레지스트리 변경 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// 새 항목 등록됨
    Registered {
        key: String,
        category: String,
        deferred: bool,
    },

    /// 같은 키로 재등록되어 교체됨
    Replaced { key: String, replace_count: u32 },

    /// 지연 등록 커밋 완료
    Committed { applied: usize, failed: usize },
}

impl RegistryEvent {
    /// 등록 이벤트 생성
    pub fn registered(key: impl Into<String>, category: impl Into<String>, deferred: bool) -> Self {
        Self::Registered {
            key: key.into(),
            category: category.into(),
            deferred,
        }
    }

    /// 교체 이벤트 생성
    pub fn replaced(key: impl Into<String>, replace_count: u32) -> Self {
        Self::Replaced {
            key: key.into(),
            replace_count,
        }
    }

    /// 이벤트 키 반환
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Registered { key, .. } => Some(key),
            Self::Replaced { key, .. } => Some(key),
            Self::Committed { .. } => None,
        }
    }
}

// ============================================================================
// RegistryEventHandler - 이벤트 핸들러 trait
// ============================================================================

/// 레지스트리 이벤트 핸들러
#[async_trait]
pub trait RegistryEventHandler: Send + Sync {
    /// 핸들러 이름
    fn name(&self) -> &str;

    /// 이벤트 처리
    async fn handle(&self, event: &RegistryEvent);
}
