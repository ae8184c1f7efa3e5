//! Registry Snapshot - 특정 시점의 이름 → 정의 매핑
//!
//! 컨텍스트는 생성 시점의 스냅샷으로 조립됩니다. 스냅샷은 정의를 복제하지 않고
//! 공유하며, 이후 레지스트리 변경의 영향을 받지 않습니다.

use crate::component::DefinitionRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// RegistrySnapshot - 레지스트리 스냅샷
// ============================================================================

/// 레지스트리 스냅샷 (복제 비용이 낮음)
#[derive(Clone)]
pub struct RegistrySnapshot {
    /// 원본 레지스트리 이름
    registry: String,

    /// 스냅샷 생성 시간
    taken_at: DateTime<Utc>,

    /// 저장된 항목들
    entries: Arc<HashMap<String, DefinitionRef>>,
}

impl RegistrySnapshot {
    pub(crate) fn new(registry: impl Into<String>, entries: HashMap<String, DefinitionRef>) -> Self {
        Self {
            registry: registry.into(),
            taken_at: Utc::now(),
            entries: Arc::new(entries),
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// 항목 가져오기
    pub fn get(&self, key: &str) -> Option<&DefinitionRef> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 모든 키 (정렬)
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 항목 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DefinitionRef)> {
        self.entries.iter()
    }

    /// 스냅샷 정보
    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            registry: self.registry.clone(),
            taken_at: self.taken_at,
            entry_count: self.entries.len(),
        }
    }
}

impl std::fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySnapshot")
            .field("registry", &self.registry)
            .field("taken_at", &self.taken_at)
            .field("keys", &self.keys())
            .finish()
    }
}

/// 스냅샷 요약 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub registry: String,
    pub taken_at: DateTime<Utc>,
    pub entry_count: usize,
}
