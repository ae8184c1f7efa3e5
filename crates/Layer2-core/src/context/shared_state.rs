//! Shared State - 컨텍스트 생성 시 넘겨받는 공유 파라미터

use lineage_foundation::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// 컨텍스트의 공유 상태 (생성 후 변경 불가)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedState {
    values: Arc<Map<String, Value>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 값에서 생성 (객체만 허용)
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::InvalidInput(format!(
                "Shared state must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// 값 추가 (빌더)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 타입으로 꺼내기
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .get(key)
            .ok_or_else(|| Error::NotFound(format!("Shared state key '{}'", key)))?;
        T::deserialize(value).map_err(|e| {
            Error::TypeMismatch(format!("Shared state key '{}': {}", key, e))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.as_ref().clone())
    }
}

impl From<Map<String, Value>> for SharedState {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(map),
        }
    }
}

impl Serialize for SharedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SharedState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<String, Value>>();
        Self::from(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let state = SharedState::from_value(json!({"env": "prod", "port": 8080})).unwrap();
        assert_eq!(state.get("env"), Some(&json!("prod")));
        assert_eq!(state.len(), 2);

        assert!(SharedState::from_value(Value::Null).unwrap().is_empty());
        assert!(matches!(
            SharedState::from_value(json!([1, 2])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_as() {
        let state = SharedState::new().with("env", "prod").with("retries", 3);

        let env: String = state.get_as("env").unwrap();
        let retries: u32 = state.get_as("retries").unwrap();
        assert_eq!(env, "prod");
        assert_eq!(retries, 3);

        assert!(state.get_as::<String>("missing").unwrap_err().is_not_found());
        assert!(matches!(
            state.get_as::<u32>("env"),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_from_iter_and_clone_is_cheap() {
        let state: SharedState = vec![("a", 1), ("b", 2)].into_iter().collect();
        let copy = state.clone();
        assert_eq!(copy, state);
        assert_eq!(copy.to_value(), json!({"a": 1, "b": 2}));
    }
}
