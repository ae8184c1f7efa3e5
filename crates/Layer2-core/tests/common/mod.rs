//! 통합 테스트 공용 컴포넌트

#![allow(dead_code)]

use async_trait::async_trait;
use lineage_core::{
    Component, ComponentArgs, ComponentInstance, ContextRef, DefinitionRef, Error, FnDefinition,
    OnceSlot, Result, Scope, Subclass,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Logger
// ============================================================================

pub struct Logger {
    pub level: String,
    scope: Scope,
    banner: OnceSlot<String>,
    banner_builds: AtomicUsize,
}

impl Logger {
    /// 최초 호출 때 한 번만 배너를 만듦
    pub async fn banner(&self) -> Result<&String> {
        self.banner
            .run(|| async {
                self.banner_builds.fetch_add(1, Ordering::SeqCst);
                let context = self
                    .scope
                    .upgrade()
                    .ok_or_else(|| Error::ContextReleased("Logger".into()))?;
                let env = context
                    .shared_state()
                    .get("env")
                    .and_then(Value::as_str)
                    .unwrap_or("dev")
                    .to_string();
                Ok(format!("[{}] level={}", env, self.level))
            })
            .await
    }

    pub fn banner_builds(&self) -> usize {
        self.banner_builds.load(Ordering::SeqCst)
    }
}

impl Component for Logger {
    fn component_name(&self) -> &str {
        "Logger"
    }

    fn context(&self) -> Option<&ContextRef> {
        self.scope.context()
    }
}

#[async_trait]
impl Subclass for Logger {
    const NAME: &'static str = "Logger";
    const CATEGORY: &'static str = "observability";

    async fn construct(scope: Scope, args: ComponentArgs) -> Result<Self> {
        let level = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or("info")
            .to_string();
        Ok(Self {
            level,
            scope,
            banner: OnceSlot::new(),
            banner_builds: AtomicUsize::new(0),
        })
    }
}

// ============================================================================
// Metrics
// ============================================================================

pub struct Metrics {
    pub namespace: String,
    scope: Scope,
}

impl Component for Metrics {
    fn component_name(&self) -> &str {
        "Metrics"
    }

    fn context(&self) -> Option<&ContextRef> {
        self.scope.context()
    }
}

#[async_trait]
impl Subclass for Metrics {
    const NAME: &'static str = "Metrics";
    const CATEGORY: &'static str = "observability";

    async fn construct(scope: Scope, args: ComponentArgs) -> Result<Self> {
        let namespace = args
            .first()
            .and_then(|arg| arg.get("key"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Metrics requires a namespace key".into()))?
            .to_string();
        Ok(Self { namespace, scope })
    }
}

// ============================================================================
// 이름표 컴포넌트
// ============================================================================

/// 정의 이름과 버전만 가진 컴포넌트
pub struct Tagged {
    pub name: String,
    pub version: u32,
}

impl Component for Tagged {
    fn component_name(&self) -> &str {
        &self.name
    }
}

/// 고정 버전의 `Tagged`를 만드는 정의
pub fn tagged(name: &'static str, version: u32) -> DefinitionRef {
    FnDefinition::new(name, move |_scope: Scope, _args: ComponentArgs| async move {
        let instance: ComponentInstance = Arc::new(Tagged {
            name: name.to_string(),
            version,
        });
        Ok(instance)
    })
    .into_ref()
}
