//! OnceSlot - 인스턴스 단위 1회 실행
//!
//! 같은 인스턴스에서 여러 번 호출되어도 처음 성공한 결과만 남깁니다.
//! 실패하면 슬롯은 비어 있고 다음 호출이 다시 실행합니다.

use lineage_foundation::Result;
use std::future::Future;
use tokio::sync::OnceCell;

/// 1회 실행 슬롯
pub struct OnceSlot<T> {
    cell: OnceCell<T>,
}

impl<T> OnceSlot<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 이미 실행되었는지
    pub fn is_executed(&self) -> bool {
        self.cell.initialized()
    }

    /// 실행 결과 (실행 전이면 None)
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// 처음 한 번만 실행, 이후에는 저장된 결과 반환
    pub async fn run<F, Fut>(&self, f: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.cell.get_or_try_init(f).await
    }
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OnceSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceSlot").field("value", &self.cell.get()).finish()
    }
}
