//! Deferred Registration - 2단계 등록
//!
//! `register_deferred`는 레지스트리의 커밋 채널에 일회성 리스너를 걸어 둡니다.
//! `commit()`이 채널을 발행하면 대기 중인 모든 등록이 동시에 적용되고,
//! 항목별 결과가 `CommitReport`로 돌아옵니다.

use super::dynamic::ComponentRegistry;
use crate::component::DefinitionRef;
use async_trait::async_trait;
use lineage_foundation::{ChannelListener, EmissionReport, Error, Result};
use std::sync::Arc;

// ============================================================================
// DeferredRegistration - 커밋 시 적용되는 등록
// ============================================================================

/// 커밋 채널에 걸리는 등록 리스너
pub(crate) struct DeferredRegistration {
    key: String,
    definition: DefinitionRef,
}

impl DeferredRegistration {
    pub(crate) fn new(key: String, definition: DefinitionRef) -> Self {
        Self { key, definition }
    }
}

#[async_trait]
impl ChannelListener<ComponentRegistry> for DeferredRegistration {
    fn name(&self) -> &str {
        &self.key
    }

    async fn on_emit(&self, registry: &ComponentRegistry) -> Result<()> {
        registry
            .insert_entry(self.key.clone(), Arc::clone(&self.definition), true)
            .await
    }
}

// ============================================================================
// CommitReport
// ============================================================================

/// 지연 등록 하나의 결과
#[derive(Debug)]
pub struct CommitOutcome {
    pub key: String,
    pub result: Result<()>,
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        self.result.is_ok()
    }
}

/// 커밋 결과 (등록 순서)
#[derive(Debug, Default)]
pub struct CommitReport {
    pub outcomes: Vec<CommitOutcome>,
}

impl CommitReport {
    pub(crate) fn from_emission(report: EmissionReport) -> Self {
        let outcomes = report
            .outcomes
            .into_iter()
            .map(|outcome| CommitOutcome {
                key: outcome.name,
                result: outcome.result,
            })
            .collect();
        Self { outcomes }
    }

    /// 모두 적용되었는지
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CommitOutcome::is_applied)
    }

    /// 적용된 키
    pub fn applied(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_applied())
            .map(|o| o.key.as_str())
            .collect()
    }

    /// 실패한 항목
    pub fn failures(&self) -> impl Iterator<Item = &CommitOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 하나라도 실패했으면 첫 번째 에러 반환, 아니면 적용된 키
    pub fn into_result(self) -> Result<Vec<String>> {
        let mut applied = Vec::with_capacity(self.outcomes.len());
        for outcome in self.outcomes {
            match outcome.result {
                Ok(()) => applied.push(outcome.key),
                Err(e) => {
                    return Err(match e {
                        Error::Listener { .. } | Error::AlreadyRegistered(_) | Error::InvalidInput(_) => e,
                        other => Error::listener(outcome.key, other.to_string()),
                    })
                }
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(results: Vec<(&str, Result<()>)>) -> CommitReport {
        let outcomes = results
            .into_iter()
            .map(|(key, result)| CommitOutcome {
                key: key.to_string(),
                result,
            })
            .collect();
        CommitReport { outcomes }
    }

    #[test]
    fn test_report_accessors() {
        let report = report(vec![
            ("Logger", Ok(())),
            ("Metrics", Err(Error::AlreadyRegistered("Metrics".into()))),
        ]);

        assert!(!report.is_success());
        assert_eq!(report.len(), 2);
        assert_eq!(report.applied(), vec!["Logger"]);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failures().next().unwrap().key, "Metrics");

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
    }

    #[test]
    fn test_into_result_wraps_other_errors() {
        let report = report(vec![("Cache", Err(Error::Internal("disk full".into())))]);
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, Error::Listener { ref listener, .. } if listener == "Cache"));
    }

    #[test]
    fn test_into_result_success() {
        let report = report(vec![("A", Ok(())), ("B", Ok(()))]);
        assert_eq!(report.into_result().unwrap(), vec!["A".to_string(), "B".to_string()]);
        assert!(CommitReport::default().is_success());
    }
}
