//! Extension Point - 레지스트리와 컨텍스트 팩토리를 묶은 기반 컴포넌트
//!
//! 확장 지점 하나가 자기 레지스트리를 소유하고, 그 레지스트리로 컨텍스트를
//! 만듭니다. 정적 멤버는 확장 지점 자체에, 인스턴스 멤버는 만들어지는 각
//! 컨텍스트에 붙습니다.
//!
//! ## 사용 예시
//!
//! ```ignore
//! let services = ExtensionPoint::builder("services")
//!     .config(LineageConfig::discover()?)
//!     .static_member("name", |ep, _| Ok(json!(ep.name())))
//!     .instance_member("env", |ctx, _| Ok(ctx.shared_state().get("env").cloned().unwrap_or_default()))
//!     .build();
//!
//! services.register(definition_of::<Logger>()).await?;
//! services.extend(definition_of::<Metrics>()).await?;
//! services.commit().await.into_result()?;
//!
//! let ctx = services.create_context(SharedState::new().with("env", "prod")).await;
//! let logger = ctx.call_component("Logger", vec![]).await?;
//! ```

use crate::component::{ComponentArgs, ComponentInstance, DefinitionRef};
use crate::context::{Context, ContextFactory, SharedState};
use crate::registry::{CommitReport, ComponentRegistry};
use lineage_foundation::{AttachTo, LineageConfig, Member, MemberTable, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Builder
// ============================================================================

/// ExtensionPoint 빌더
pub struct ExtensionPointBuilder {
    name: String,
    config: LineageConfig,
    statics: MemberTable<ExtensionPoint>,
    instance_members: MemberTable<Context>,
    /// 빌드 직후 실행할 정적 멤버 (이름, 입력)
    executions: Vec<(String, Value)>,
}

impl ExtensionPointBuilder {
    /// 설정 지정
    pub fn config(mut self, config: LineageConfig) -> Self {
        self.config = config;
        self
    }

    /// 정적 멤버 추가 (확장 지점 자체에 붙음)
    pub fn static_member<F>(mut self, name: impl Into<String>, member: F) -> Self
    where
        F: Fn(&ExtensionPoint, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.statics.insert(name, member);
        self
    }

    /// 인스턴스 멤버 추가 (모든 컨텍스트에 붙음)
    pub fn instance_member<F>(mut self, name: impl Into<String>, member: F) -> Self
    where
        F: Fn(&Context, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.instance_members.insert(name, member);
        self
    }

    /// 정적 멤버 여러 개
    pub fn static_members<I, K>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = (K, Member<ExtensionPoint>)>,
        K: Into<String>,
    {
        self.statics.attach(members);
        self
    }

    /// 인스턴스 멤버 여러 개
    pub fn instance_members<I, K>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = (K, Member<Context>)>,
        K: Into<String>,
    {
        self.instance_members.attach(members);
        self
    }

    /// 빌드 직후 정적 멤버를 한 번 실행 (등록 순서대로)
    ///
    /// 멤버는 완성된 확장 지점을 첫 인자로 받습니다.
    pub fn execute(mut self, name: impl Into<String>, input: Value) -> Self {
        self.executions.push((name.into(), input));
        self
    }

    /// 빌드 후 예약된 실행을 돌리고 첫 실패를 반환
    pub fn try_build(mut self) -> Result<ExtensionPoint> {
        let executions = std::mem::take(&mut self.executions);
        let point = self.assemble();
        for (name, input) in executions {
            point.call_static_member(&name, input)?;
            debug!(extension_point = %point.name, member = %name, "Executed static member");
        }
        Ok(point)
    }

    /// 빌드 (예약된 실행의 실패는 로그만 남김)
    pub fn build(mut self) -> ExtensionPoint {
        let executions = std::mem::take(&mut self.executions);
        let point = self.assemble();
        for (name, input) in executions {
            if let Err(e) = point.call_static_member(&name, input) {
                warn!(extension_point = %point.name, member = %name, error = %e, "Static member execution failed");
            }
        }
        point
    }

    fn assemble(self) -> ExtensionPoint {
        let registry = Arc::new(ComponentRegistry::with_config(
            self.name.clone(),
            self.config.registry.clone(),
        ));
        let factory = ContextFactory::new(Arc::clone(&registry))
            .with_config(self.config.context.clone())
            .with_members(self.instance_members);

        info!(
            extension_point = %self.name,
            static_members = self.statics.len(),
            instance_members = factory.members().len(),
            "Extension point ready"
        );

        ExtensionPoint {
            name: self.name,
            config: self.config,
            registry,
            factory,
            statics: self.statics,
        }
    }
}

// ============================================================================
// ExtensionPoint
// ============================================================================

/// 확장 지점 (기반 컴포넌트)
pub struct ExtensionPoint {
    name: String,
    config: LineageConfig,
    registry: Arc<ComponentRegistry>,
    factory: ContextFactory,
    statics: MemberTable<ExtensionPoint>,
}

impl ExtensionPoint {
    /// 기본 설정으로 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    pub fn builder(name: impl Into<String>) -> ExtensionPointBuilder {
        ExtensionPointBuilder {
            name: name.into(),
            config: LineageConfig::default(),
            statics: MemberTable::new(),
            instance_members: MemberTable::new(),
            executions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn context_factory(&self) -> &ContextFactory {
        &self.factory
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 즉시 등록
    pub async fn register(&self, definition: DefinitionRef) -> Result<()> {
        self.registry.register(definition).await
    }

    pub async fn register_as(&self, key: impl Into<String>, definition: DefinitionRef) -> Result<()> {
        self.registry.register_as(key, definition).await
    }

    /// 지연 등록 (`commit` 시 적용)
    pub async fn extend(&self, definition: DefinitionRef) -> Result<()> {
        self.registry.register_deferred(definition).await
    }

    pub async fn extend_as(&self, key: impl Into<String>, definition: DefinitionRef) -> Result<()> {
        self.registry.register_deferred_as(key, definition).await
    }

    /// 지연 등록 적용
    pub async fn commit(&self) -> CommitReport {
        self.registry.commit().await
    }

    // ========================================================================
    // 컨텍스트
    // ========================================================================

    /// 새 컨텍스트 생성
    pub async fn create_context(&self, shared_state: impl Into<SharedState>) -> Context {
        self.factory.create_context(shared_state).await
    }

    // ========================================================================
    // 정적 호출
    // ========================================================================

    /// 컨텍스트 없이 등록된 컴포넌트 생성
    pub async fn call_subclass(&self, name: &str, args: ComponentArgs) -> Result<ComponentInstance> {
        self.registry.instantiate(name, args).await
    }

    /// 등록된 정의 조회
    pub async fn get_subclass(&self, name: &str) -> Option<DefinitionRef> {
        self.registry.get(name).await
    }

    /// 정적 멤버 호출
    pub fn call_static_member(&self, name: &str, input: Value) -> Result<Value> {
        self.statics.call(self, name, input)
    }

    /// 붙은 멤버 이름 (정렬)
    pub fn members(&self, attach: AttachTo) -> Vec<String> {
        let mut names = match attach {
            AttachTo::Static => self.statics.names(),
            AttachTo::Instance => self.factory.members().names(),
        };
        names.sort();
        names
    }
}

impl std::fmt::Debug for ExtensionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("name", &self.name)
            .field("static_members", &self.statics)
            .field("factory", &self.factory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, FnDefinition};
    use lineage_foundation::{Error, RegistryConfig};
    use serde_json::json;

    struct Plain(&'static str);

    impl Component for Plain {
        fn component_name(&self) -> &str {
            self.0
        }
    }

    fn plain(name: &'static str) -> DefinitionRef {
        FnDefinition::new(name, move |_scope, _args| async move {
            let instance: ComponentInstance = Arc::new(Plain(name));
            Ok(instance)
        })
        .into_ref()
    }

    #[tokio::test]
    async fn test_register_extend_commit() {
        let point = ExtensionPoint::new("services");
        point.register(plain("Logger")).await.unwrap();
        point.extend(plain("Metrics")).await.unwrap();

        assert!(point.get_subclass("Metrics").await.is_none());

        let report = point.commit().await;
        assert!(report.is_success());
        assert!(point.get_subclass("Metrics").await.is_some());

        let context = point.create_context(SharedState::new()).await;
        assert_eq!(
            context.component_names(),
            vec!["Logger".to_string(), "Metrics".to_string()]
        );
    }

    #[tokio::test]
    async fn test_call_subclass_is_detached() {
        let point = ExtensionPoint::new("services");
        point.register_as("Log", plain("Logger")).await.unwrap();

        let instance = point.call_subclass("Log", vec![]).await.unwrap();
        assert_eq!(instance.component_name(), "Logger");
        assert!(instance.context().is_none());

        let err = point.call_subclass("Logger", vec![]).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_members() {
        let point = ExtensionPoint::builder("services")
            .static_member("name", |ep: &ExtensionPoint, _| Ok(json!(ep.name())))
            .instance_member("env", |ctx: &Context, _| {
                Ok(ctx.shared_state().get("env").cloned().unwrap_or(Value::Null))
            })
            .build();

        assert_eq!(
            point.call_static_member("name", Value::Null).unwrap(),
            json!("services")
        );
        assert!(point
            .call_static_member("env", Value::Null)
            .unwrap_err()
            .is_not_found());

        let context = point
            .create_context(SharedState::new().with("env", "prod"))
            .await;
        assert_eq!(context.call_member("env", Value::Null).unwrap(), json!("prod"));

        assert_eq!(point.members(AttachTo::Static), vec!["name".to_string()]);
        assert_eq!(point.members(AttachTo::Instance), vec!["env".to_string()]);
    }

    #[test]
    fn test_execute_runs_static_member_once_after_build() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&runs);
        let point = ExtensionPoint::builder("services")
            .static_member("announce", move |ep: &ExtensionPoint, input| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert_eq!(ep.name(), "services");
                assert_eq!(input, json!(["boot"]));
                Ok(Value::Null)
            })
            .execute("announce", json!(["boot"]))
            .try_build()
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(point.members(AttachTo::Static), vec!["announce".to_string()]);
    }

    #[test]
    fn test_execute_failure() {
        let err = ExtensionPoint::builder("services")
            .execute("missing", Value::Null)
            .try_build()
            .unwrap_err();
        assert!(err.is_not_found());

        // build()는 실패를 로그로만 남기고 확장 지점을 돌려줌
        let point = ExtensionPoint::builder("services")
            .static_member("fail", |_ep: &ExtensionPoint, _| {
                Err(Error::InvalidInput("bad".into()))
            })
            .execute("fail", Value::Null)
            .build();
        assert_eq!(point.name(), "services");
    }

    #[tokio::test]
    async fn test_config_flows_to_registry() {
        let config = LineageConfig {
            registry: RegistryConfig::strict(),
            ..LineageConfig::default()
        };
        let point = ExtensionPoint::builder("strict").config(config).build();

        point.register(plain("Logger")).await.unwrap();
        let err = point.register(plain("Logger")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
    }
}
