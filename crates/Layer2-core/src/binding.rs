//! Binding - 정의를 특정 컨텍스트에 묶은 위임 래퍼
//!
//! `BoundComponent`는 공유 정의를 그대로 쓰면서, 생성할 때마다 자신이 속한
//! 컨텍스트를 스코프로 넘깁니다. 정의는 복제되지 않으므로 레지스트리의 다른
//! 컨텍스트나 정적 호출에 영향을 주지 않습니다.

use crate::component::{ComponentArgs, ComponentDefinition, ComponentInstance, DefinitionRef, Scope};
use crate::context::ContextRef;
use crate::memo::{CacheScope, InstanceCache};
use async_trait::async_trait;
use lineage_foundation::Result;
use std::sync::Arc;
use std::time::Duration;

/// 컨텍스트에 바인딩된 컴포넌트 정의
#[derive(Clone)]
pub struct BoundComponent {
    definition: DefinitionRef,
    context: ContextRef,
}

impl BoundComponent {
    /// 정의를 컨텍스트에 바인딩
    pub fn bind(definition: DefinitionRef, context: ContextRef) -> Self {
        Self {
            definition,
            context,
        }
    }

    /// 위임 대상 (공유 정의)
    pub fn definition(&self) -> &DefinitionRef {
        &self.definition
    }

    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// 바인딩된 컨텍스트를 스코프로 생성
    pub async fn construct(&self, args: ComponentArgs) -> Result<ComponentInstance> {
        self.definition
            .construct(Scope::bound(self.context.clone()), args)
            .await
    }
}

#[async_trait]
impl ComponentDefinition for BoundComponent {
    fn name(&self) -> &str {
        self.definition.name()
    }

    fn category(&self) -> &str {
        self.definition.category()
    }

    /// 넘겨받은 스코프는 무시하고 항상 바인딩된 컨텍스트 사용
    async fn construct(&self, _scope: Scope, args: ComponentArgs) -> Result<ComponentInstance> {
        BoundComponent::construct(self, args).await
    }
}

impl CacheScope for BoundComponent {
    fn instance_cache(&self) -> Result<Arc<InstanceCache>> {
        self.context.instance_cache()
    }

    fn construct_timeout(&self) -> Option<Duration> {
        self.context.construct_timeout()
    }
}

impl std::fmt::Debug for BoundComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundComponent")
            .field("name", &self.definition.name())
            .field("context", &self.context.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, FnDefinition};
    use crate::context::{ContextFactory, SharedState};
    use crate::registry::ComponentRegistry;
    use lineage_foundation::Error;

    struct Probe {
        scope: Scope,
    }

    impl Component for Probe {
        fn component_name(&self) -> &str {
            "Probe"
        }

        fn context(&self) -> Option<&ContextRef> {
            self.scope.context()
        }
    }

    fn probe_definition() -> DefinitionRef {
        FnDefinition::new("Probe", |scope, _args| async move {
            let instance: ComponentInstance = Arc::new(Probe { scope });
            Ok(instance)
        })
        .into_ref()
    }

    #[tokio::test]
    async fn test_bound_scope_overrides_caller_scope() {
        let registry = Arc::new(ComponentRegistry::new("test"));
        registry.register(probe_definition()).await.unwrap();
        let context = ContextFactory::new(registry).create_context(SharedState::new()).await;

        let bound = context.bound_component("Probe").unwrap().clone();
        assert_eq!(ComponentDefinition::name(&bound), "Probe");

        // 분리 스코프로 호출해도 바인딩된 컨텍스트가 쓰임
        let instance = ComponentDefinition::construct(&bound, Scope::detached(), vec![])
            .await
            .unwrap();
        assert_eq!(instance.context().unwrap(), &context.context_ref());
    }

    #[tokio::test]
    async fn test_shared_definition_is_not_copied() {
        let definition = probe_definition();
        let registry = Arc::new(ComponentRegistry::new("test"));
        registry.register(Arc::clone(&definition)).await.unwrap();

        let factory = ContextFactory::new(registry);
        let a = factory.create_context(SharedState::new()).await;
        let b = factory.create_context(SharedState::new()).await;

        let bound_a = a.bound_component("Probe").unwrap();
        let bound_b = b.bound_component("Probe").unwrap();
        assert!(Arc::ptr_eq(bound_a.definition(), &definition));
        assert!(Arc::ptr_eq(bound_b.definition(), &definition));
        assert_ne!(bound_a.context(), bound_b.context());
    }

    #[tokio::test]
    async fn test_released_context() {
        let registry = Arc::new(ComponentRegistry::new("test"));
        registry.register(probe_definition()).await.unwrap();
        let context = ContextFactory::new(registry).create_context(SharedState::new()).await;
        let bound = context.bound_component("Probe").unwrap().clone();

        drop(context);

        assert!(!bound.context().is_alive());
        assert!(matches!(
            bound.instance_cache(),
            Err(Error::ContextReleased(_))
        ));
    }
}
