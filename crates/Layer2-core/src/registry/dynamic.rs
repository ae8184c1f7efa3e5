//! Component Registry - 런타임에 확장되는 이름 → 정의 레지스트리

use super::deferred::{CommitReport, DeferredRegistration};
use super::entry::{EntryMetadata, RegistryEntry};
use super::snapshot::RegistrySnapshot;
use super::traits::{RegistryEvent, RegistryEventHandler};
use crate::component::{ComponentArgs, ComponentInstance, DefinitionRef, Scope, TracedDefinition};
use lineage_foundation::{apply_if, Error, EventedChannel, RegistryConfig, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

// ============================================================================
// ComponentRegistry
// ============================================================================

/// 컴포넌트 레지스트리 - Interior Mutability 패턴으로 Thread-safe한 런타임 등록 지원
///
/// 같은 키로 다시 등록하면 기본적으로 마지막 등록이 이깁니다
/// (`RegistryConfig::allow_overwrite = false`면 `AlreadyRegistered` 에러).
pub struct ComponentRegistry {
    /// 레지스트리 이름 (디버깅용)
    name: String,

    /// 설정
    config: RegistryConfig,

    /// 항목 저장소 (RwLock으로 내부 가변성)
    entries: RwLock<HashMap<String, RegistryEntry>>,

    /// 지연 등록 채널 (commit 시 발행)
    deferred: EventedChannel<ComponentRegistry>,

    /// 이벤트 채널
    event_tx: broadcast::Sender<RegistryEvent>,

    /// 이벤트 핸들러
    handlers: RwLock<Vec<Arc<dyn RegistryEventHandler>>>,
}

impl ComponentRegistry {
    /// 새 레지스트리 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, RegistryConfig::default())
    }

    /// 설정과 함께 생성
    pub fn with_config(name: impl Into<String>, config: RegistryConfig) -> Self {
        let name = name.into();
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            deferred: EventedChannel::new(format!("{}:deferred", name)),
            name,
            config,
            entries: RwLock::new(HashMap::new()),
            event_tx,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 정의 자체의 이름으로 등록
    pub async fn register(&self, definition: DefinitionRef) -> Result<()> {
        let key = definition.name().to_string();
        self.register_as(key, definition).await
    }

    /// 지정한 이름으로 등록
    pub async fn register_as(&self, key: impl Into<String>, definition: DefinitionRef) -> Result<()> {
        self.insert_entry(key.into(), definition, false).await
    }

    /// 여러 정의 등록 (첫 에러에서 중단)
    pub async fn register_all<I>(&self, definitions: I) -> Result<()>
    where
        I: IntoIterator<Item = DefinitionRef>,
    {
        for definition in definitions {
            self.register(definition).await?;
        }
        Ok(())
    }

    /// 지연 등록 - `commit()` 전까지 조회되지 않음
    pub async fn register_deferred(&self, definition: DefinitionRef) -> Result<()> {
        let key = definition.name().to_string();
        self.register_deferred_as(key, definition).await
    }

    /// 지정한 이름으로 지연 등록
    pub async fn register_deferred_as(
        &self,
        key: impl Into<String>,
        definition: DefinitionRef,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let listener = DeferredRegistration::new(key.clone(), definition);
        self.deferred.once(Arc::new(listener)).await;

        debug!("[{}] Deferred: {}", self.name, key);
        Ok(())
    }

    /// 대기 중인 지연 등록 적용
    ///
    /// 모든 등록이 끝난 뒤 반환됩니다. 일부가 실패해도 나머지는 적용됩니다.
    pub async fn commit(&self) -> CommitReport {
        // 대기 목록은 emit이 원자적으로 가져감 (동시 커밋은 빈 보고서를 받음)
        let report = CommitReport::from_emission(self.deferred.emit(self).await);
        if report.is_empty() {
            debug!("[{}] Commit with nothing pending", self.name);
            return report;
        }

        let failed = report.failed_count();
        let applied = report.len() - failed;

        if failed > 0 {
            warn!("[{}] Commit finished: {} applied, {} failed", self.name, applied, failed);
        } else {
            info!("[{}] Commit finished: {} applied", self.name, applied);
        }

        self.emit_event(RegistryEvent::Committed { applied, failed }).await;
        report
    }

    /// 대기 중인 지연 등록 수
    pub async fn pending_count(&self) -> usize {
        self.deferred.listener_count().await
    }

    /// 항목 저장 (즉시 / 커밋 공용)
    pub(crate) async fn insert_entry(
        &self,
        key: String,
        definition: DefinitionRef,
        deferred: bool,
    ) -> Result<()> {
        validate_key(&key)?;
        let definition = apply_if(self.config.trace_construction, TracedDefinition::wrap)(definition);
        let category = definition.category().to_string();

        let event = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(&key) {
                Some(existing) => {
                    if !self.config.allow_overwrite {
                        return Err(Error::AlreadyRegistered(format!(
                            "'{}' in registry '{}'",
                            key, self.name
                        )));
                    }
                    existing.replace(definition, deferred);
                    warn!(
                        "[{}] Key '{}' already registered, overwriting (replace #{})",
                        self.name, key, existing.metadata.replace_count
                    );
                    RegistryEvent::replaced(&key, existing.metadata.replace_count)
                }
                None => {
                    let metadata = EntryMetadata::new(&key, &category).deferred(deferred);
                    entries.insert(key.clone(), RegistryEntry::new(definition, metadata));
                    debug!("[{}] Registered: {} ({})", self.name, key, category);
                    RegistryEvent::registered(&key, category, deferred)
                }
            }
        };

        // 이벤트 발행
        self.emit_event(event).await;
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 항목 조회 (없으면 NotFound)
    pub async fn lookup(&self, key: &str) -> Result<DefinitionRef> {
        self.get(key).await.ok_or_else(|| {
            Error::NotFound(format!("Component '{}' in registry '{}'", key, self.name))
        })
    }

    /// 항목 조회
    pub async fn get(&self, key: &str) -> Option<DefinitionRef> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| Arc::clone(&e.definition))
    }

    /// 항목 메타데이터 조회
    pub async fn metadata(&self, key: &str) -> Option<EntryMetadata> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.metadata.clone())
    }

    /// 항목 존재 여부
    pub async fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(key)
    }

    /// 모든 키 (정렬)
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 항목 수
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 비어있는지 확인
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 카테고리별 키 (정렬)
    pub async fn by_category(&self, category: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .values()
            .filter(|e| e.metadata.category == category)
            .map(|e| e.key().to_string())
            .collect();
        keys.sort();
        keys
    }

    /// 모든 카테고리 (정렬)
    pub async fn categories(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries
            .values()
            .map(|e| e.metadata.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 현재 상태의 스냅샷
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let entries = self.entries.read().await;
        let map = entries
            .iter()
            .map(|(key, entry)| (key.clone(), Arc::clone(&entry.definition)))
            .collect();
        RegistrySnapshot::new(&self.name, map)
    }

    /// 컨텍스트 없이 생성 (정적 호출)
    pub async fn instantiate(&self, key: &str, args: ComponentArgs) -> Result<ComponentInstance> {
        let definition = self.lookup(key).await?;
        definition.construct(Scope::detached(), args).await
    }

    // ========================================================================
    // 이벤트
    // ========================================================================

    /// 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_tx.subscribe()
    }

    /// 이벤트 핸들러 등록
    pub async fn add_handler(&self, handler: Arc<dyn RegistryEventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// 이벤트 발행
    async fn emit_event(&self, event: RegistryEvent) {
        // 브로드캐스트 채널로 발행 (구독자가 없으면 무시)
        let _ = self.event_tx.send(event.clone());

        // 핸들러 호출
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    // ========================================================================
    // 통계
    // ========================================================================

    /// 레지스트리 통계
    pub async fn stats(&self) -> RegistryStats {
        let pending = self.pending_count().await;
        let entries = self.entries.read().await;

        let categories = entries
            .values()
            .map(|e| e.metadata.category.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        RegistryStats {
            name: self.name.clone(),
            total: entries.len(),
            deferred: entries.values().filter(|e| e.metadata.deferred).count(),
            replacements: entries.values().map(|e| e.metadata.replace_count as usize).sum(),
            pending,
            categories,
        }
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidInput("Component name must not be empty".into()));
    }
    Ok(())
}

/// 레지스트리 통계
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub name: String,
    pub total: usize,
    /// 커밋으로 들어온 항목 수
    pub deferred: usize,
    /// 누적 교체 횟수
    pub replacements: usize,
    /// 커밋 대기 중인 등록 수
    pub pending: usize,
    pub categories: usize,
}
