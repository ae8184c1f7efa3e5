//! Context Factory - 레지스트리 스냅샷으로 컨텍스트 생성

use super::{Context, SharedState};
use crate::registry::{ComponentRegistry, RegistrySnapshot};
use lineage_foundation::{ContextConfig, MemberTable};
use std::sync::Arc;

/// 컨텍스트 팩토리
///
/// `create_context` 호출 시점의 레지스트리 내용이 그대로 바인딩됩니다.
/// 이후 등록된 정의는 이미 만들어진 컨텍스트에 보이지 않습니다.
#[derive(Clone)]
pub struct ContextFactory {
    registry: Arc<ComponentRegistry>,
    config: ContextConfig,
    /// 모든 컨텍스트에 붙는 인스턴스 멤버
    members: Arc<MemberTable<Context>>,
}

impl ContextFactory {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            config: ContextConfig::default(),
            members: Arc::new(MemberTable::new()),
        }
    }

    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_members(mut self, members: MemberTable<Context>) -> Self {
        self.members = Arc::new(members);
        self
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn members(&self) -> &MemberTable<Context> {
        &self.members
    }

    /// 현재 레지스트리로 새 컨텍스트 생성
    pub async fn create_context(&self, shared_state: impl Into<SharedState>) -> Context {
        let snapshot = self.registry.snapshot().await;
        self.create_from_snapshot(&snapshot, shared_state)
    }

    /// 주어진 스냅샷으로 새 컨텍스트 생성
    pub fn create_from_snapshot(
        &self,
        snapshot: &RegistrySnapshot,
        shared_state: impl Into<SharedState>,
    ) -> Context {
        Context::assemble(self.clone(), snapshot, shared_state.into())
    }
}

impl std::fmt::Debug for ContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFactory")
            .field("registry", &self.registry.name())
            .field("config", &self.config)
            .field("members", &self.members)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentInstance, FnDefinition};
    use serde_json::json;

    struct Unit(&'static str);

    impl Component for Unit {
        fn component_name(&self) -> &str {
            self.0
        }
    }

    fn unit(name: &'static str) -> FnDefinition {
        FnDefinition::new(name, move |_scope, _args| async move {
            let instance: ComponentInstance = Arc::new(Unit(name));
            Ok(instance)
        })
    }

    #[tokio::test]
    async fn test_context_sees_registry_at_creation() {
        let registry = Arc::new(ComponentRegistry::new("test"));
        registry.register(unit("A").into_ref()).await.unwrap();

        let factory = ContextFactory::new(Arc::clone(&registry));
        let early = factory.create_context(SharedState::new()).await;

        registry.register(unit("B").into_ref()).await.unwrap();
        let late = factory.create_context(SharedState::new()).await;

        assert_eq!(early.component_names(), vec!["A".to_string()]);
        assert_eq!(late.component_names(), vec!["A".to_string(), "B".to_string()]);
        assert!(early.call_component("B", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_create_from_snapshot() {
        let registry = Arc::new(ComponentRegistry::new("test"));
        registry.register(unit("A").into_ref()).await.unwrap();
        let snapshot = registry.snapshot().await;

        registry.register(unit("B").into_ref()).await.unwrap();

        let factory = ContextFactory::new(registry);
        let context = factory.create_from_snapshot(&snapshot, SharedState::from_value(json!({"k": 1})).unwrap());

        assert_eq!(context.component_names(), vec!["A".to_string()]);
        assert_eq!(context.shared_state().get("k"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_contexts_are_isolated() {
        let registry = Arc::new(ComponentRegistry::new("test"));
        let factory = ContextFactory::new(registry);

        let a = factory.create_context(SharedState::new().with("n", 1)).await;
        let b = factory.create_context(SharedState::new().with("n", 2)).await;

        assert_ne!(a.id(), b.id());
        assert!(!Arc::ptr_eq(a.cache(), b.cache()));
        assert_eq!(a.shared_state().get("n"), Some(&json!(1)));
        assert_eq!(b.shared_state().get("n"), Some(&json!(2)));
    }
}
