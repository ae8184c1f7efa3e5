//! Decorator - 범용 조합 도구
//!
//! - `apply_if`: 조건부 변환 (조건이 거짓이면 항등 함수)
//! - `MemberTable`: 대상에 이름 붙은 기능(member)을 붙이는 테이블
//!
//! `AttachTo`로 붙일 위치를 고릅니다. `Static`은 확장 지점 자체에,
//! `Instance`는 그 확장 지점에서 만들어지는 각 인스턴스(컨텍스트)에 붙습니다.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// apply_if
// ============================================================================

/// 조건부 변환
///
/// `condition`이 참이면 `transform`을, 거짓이면 값을 그대로 돌려주는 함수를 반환합니다.
pub fn apply_if<T, F>(condition: bool, transform: F) -> impl FnOnce(T) -> T
where
    F: FnOnce(T) -> T,
{
    move |value| {
        if condition {
            transform(value)
        } else {
            value
        }
    }
}

// ============================================================================
// Members
// ============================================================================

/// 기능을 붙일 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTo {
    /// 확장 지점 자체 (정적)
    Static,
    /// 확장 지점이 만드는 각 인스턴스
    Instance,
}

impl std::fmt::Display for AttachTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

/// 수신자 `R`에 붙는 기능
pub type Member<R> = Arc<dyn Fn(&R, Value) -> Result<Value> + Send + Sync>;

/// 이름 → 기능 테이블
pub struct MemberTable<R> {
    members: HashMap<String, Member<R>>,
}

impl<R> MemberTable<R> {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }

    /// 기능 여러 개를 붙임 (같은 이름은 덮어씀)
    pub fn attach<I, K>(&mut self, members: I)
    where
        I: IntoIterator<Item = (K, Member<R>)>,
        K: Into<String>,
    {
        for (name, member) in members {
            self.members.insert(name.into(), member);
        }
    }

    /// 기능 하나를 붙임
    pub fn insert<F>(&mut self, name: impl Into<String>, member: F)
    where
        F: Fn(&R, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.insert(name.into(), Arc::new(member));
    }

    /// 기능 호출
    pub fn call(&self, receiver: &R, name: &str, input: Value) -> Result<Value> {
        let member = self
            .members
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Member '{}'", name)))?;
        member(receiver, input)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<R> Default for MemberTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for MemberTable<R> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<R> std::fmt::Debug for MemberTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberTable")
            .field("members", &self.names())
            .finish()
    }
}
