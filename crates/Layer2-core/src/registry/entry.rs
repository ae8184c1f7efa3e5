//! Registry Entry - 레지스트리 항목 정의

use crate::component::DefinitionRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// EntryMetadata - 항목 메타데이터
// ============================================================================

/// 레지스트리 항목의 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// 등록 키 (이름)
    pub key: String,

    /// 카테고리
    pub category: String,

    /// 지연 등록(commit)으로 들어왔는지
    pub deferred: bool,

    /// 등록 시간
    pub registered_at: DateTime<Utc>,

    /// 마지막 업데이트 시간
    pub updated_at: DateTime<Utc>,

    /// 교체 횟수
    pub replace_count: u32,
}

impl EntryMetadata {
    /// 새 메타데이터 생성
    pub fn new(key: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            category: category.into(),
            deferred: false,
            registered_at: now,
            updated_at: now,
            replace_count: 0,
        }
    }

    /// 지연 등록 표시
    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    /// 교체로 인한 업데이트
    pub fn mark_replaced(&mut self, category: impl Into<String>, deferred: bool) {
        self.category = category.into();
        self.deferred = deferred;
        self.updated_at = Utc::now();
        self.replace_count += 1;
    }
}

// ============================================================================
// RegistryEntry - 레지스트리 항목
// ============================================================================

/// 레지스트리 항목 (정의 + 메타데이터)
pub struct RegistryEntry {
    /// 등록된 정의
    pub definition: DefinitionRef,

    /// 메타데이터
    pub metadata: EntryMetadata,
}

impl RegistryEntry {
    /// 새 항목 생성
    pub fn new(definition: DefinitionRef, metadata: EntryMetadata) -> Self {
        Self {
            definition,
            metadata,
        }
    }

    /// 정의 교체 (이전 정의 반환)
    pub fn replace(&mut self, definition: DefinitionRef, deferred: bool) -> DefinitionRef {
        self.metadata.mark_replaced(definition.category(), deferred);
        std::mem::replace(&mut self.definition, definition)
    }

    /// 키
    pub fn key(&self) -> &str {
        &self.metadata.key
    }
}

impl Clone for RegistryEntry {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            metadata: self.metadata.clone(),
        }
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("definition", &self.definition.name())
            .field("metadata", &self.metadata)
            .finish()
    }
}
