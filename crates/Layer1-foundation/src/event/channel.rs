//! Evented Channel - "모두 완료" 방식의 브로드캐스트
//!
//! 등록된 리스너를 동시에 실행하고, 모든 리스너가 끝난 뒤에야 발행이 완료됩니다.
//! 한 리스너의 실패가 다른 리스너를 취소하지 않으며, 실패는 리스너별로
//! `EmissionReport`에 담겨 호출자에게 돌아갑니다.

use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

// ============================================================================
// ChannelListener Trait
// ============================================================================

/// 채널 리스너 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 채널 리스너 trait
///
/// 발행 시점에 이벤트 값을 빌려 받아 비동기로 처리합니다.
#[async_trait]
pub trait ChannelListener<E: ?Sized>: Send + Sync {
    /// 리스너 이름 (보고서 / 디버깅용)
    fn name(&self) -> &str;

    /// 이벤트 처리
    async fn on_emit(&self, event: &E) -> Result<()>;
}

// ============================================================================
// EmissionReport
// ============================================================================

/// 리스너 하나의 실행 결과
#[derive(Debug)]
pub struct ListenerOutcome {
    pub id: ListenerId,
    pub name: String,
    pub result: Result<()>,
}

impl ListenerOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// 한 번의 발행 결과 (리스너별)
#[derive(Debug, Default)]
pub struct EmissionReport {
    pub outcomes: Vec<ListenerOutcome>,
}

impl EmissionReport {
    /// 모든 리스너가 성공했는지
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ListenerOutcome::is_success)
    }

    /// 실행된 리스너 수
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 성공한 리스너 수
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// 실패한 리스너들
    pub fn failures(&self) -> impl Iterator<Item = &ListenerOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

// ============================================================================
// EventedChannel
// ============================================================================

/// 등록된 리스너 정보
struct RegisteredListener<E: ?Sized> {
    id: ListenerId,
    listener: Arc<dyn ChannelListener<E>>,
    /// 한 번 실행 후 제거
    once: bool,
}

/// 모든 리스너의 완료를 기다리는 이벤트 채널
///
/// ## 사용법
///
/// ```ignore
/// let channel: EventedChannel<Signal> = EventedChannel::new("commit");
///
/// channel.once(Arc::new(MyListener)).await;
///
/// let report = channel.emit(&Signal).await;
/// for failure in report.failures() {
///     eprintln!("{} failed", failure.name);
/// }
/// ```
pub struct EventedChannel<E: ?Sized> {
    /// 채널 이름 (디버깅용)
    name: String,

    /// 등록된 리스너 (등록 순서 유지)
    listeners: RwLock<Vec<RegisteredListener<E>>>,

    /// 리스너 ID 카운터
    listener_counter: AtomicU64,

    /// 발행 횟수
    emission_count: AtomicU64,
}

impl<E: ?Sized + Sync> EventedChannel<E> {
    /// 새 채널 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: RwLock::new(Vec::new()),
            listener_counter: AtomicU64::new(0),
            emission_count: AtomicU64::new(0),
        }
    }

    /// 채널 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 리스너 등록 (발행마다 실행)
    pub async fn on(&self, listener: Arc<dyn ChannelListener<E>>) -> ListenerId {
        self.add(listener, false).await
    }

    /// 일회성 리스너 등록 (다음 발행에서 한 번 실행 후 제거)
    pub async fn once(&self, listener: Arc<dyn ChannelListener<E>>) -> ListenerId {
        self.add(listener, true).await
    }

    async fn add(&self, listener: Arc<dyn ChannelListener<E>>, once: bool) -> ListenerId {
        let id = ListenerId::new(self.listener_counter.fetch_add(1, Ordering::SeqCst));

        debug!(
            channel = %self.name,
            listener_name = listener.name(),
            listener_id = %id,
            once,
            "Registering channel listener"
        );

        let mut listeners = self.listeners.write().await;
        listeners.push(RegisteredListener { id, listener, once });
        id
    }

    /// 리스너 해제
    pub async fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().await;
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        before != listeners.len()
    }

    /// 등록된 리스너 수
    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// 총 발행 횟수
    pub fn emission_count(&self) -> u64 {
        self.emission_count.load(Ordering::SeqCst)
    }

    /// 이벤트 발행 - 모든 리스너가 끝날 때까지 대기
    pub async fn emit(&self, event: &E) -> EmissionReport {
        let emission = self.emission_count.fetch_add(1, Ordering::SeqCst) + 1;

        // 실행 대상 확정 + 일회성 리스너 제거 (동시 발행에서 중복 실행 방지)
        let targets: Vec<(ListenerId, Arc<dyn ChannelListener<E>>)> = {
            let mut listeners = self.listeners.write().await;
            let targets = listeners
                .iter()
                .map(|l| (l.id, Arc::clone(&l.listener)))
                .collect();
            listeners.retain(|l| !l.once);
            targets
        };

        trace!(
            channel = %self.name,
            listeners = targets.len(),
            "Emitting #{}", emission
        );

        let runs = targets.iter().map(|(id, listener)| async move {
            // 패닉도 해당 리스너의 실패로 기록
            let result = AssertUnwindSafe(listener.on_emit(event))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(Error::listener(
                        listener.name(),
                        format!("panicked: {}", panic_message(panic.as_ref())),
                    ))
                });
            if let Err(ref e) = result {
                warn!(
                    channel = %self.name,
                    listener_id = %id,
                    listener_name = listener.name(),
                    error = %e,
                    "Channel listener failed"
                );
            }
            ListenerOutcome {
                id: *id,
                name: listener.name().to_string(),
                result,
            }
        });

        let outcomes = join_all(runs).await;
        EmissionReport { outcomes }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Signal;

    struct CountingListener {
        name: String,
        count: AtomicUsize,
        delay: Duration,
        fail: bool,
        panic: bool,
    }

    impl CountingListener {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                count: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
                panic: false,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn panicking(mut self) -> Self {
            self.panic = true;
            self
        }

        fn call_count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelListener<Signal> for CountingListener {
        fn name(&self) -> &str {
            &self.name
        }

        async fn on_emit(&self, _event: &Signal) -> Result<()> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("listener {} blew up", self.name);
            }
            if self.fail {
                return Err(Error::listener(&self.name, "refused"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_emit_waits_for_all_listeners() {
        let channel = EventedChannel::new("test");
        let fast = Arc::new(CountingListener::new("fast"));
        let slow = Arc::new(CountingListener::new("slow").slow(Duration::from_millis(30)));

        channel.on(fast.clone()).await;
        channel.on(slow.clone()).await;

        let report = channel.emit(&Signal).await;

        // emit이 반환될 때 느린 리스너도 이미 끝나 있어야 함
        assert_eq!(slow.call_count(), 1);
        assert_eq!(fast.call_count(), 1);
        assert!(report.is_success());
        assert_eq!(report.len(), 2);
    }

    #[tokio::test]
    async fn test_listeners_run_concurrently() {
        let channel = EventedChannel::new("test");
        for i in 0..4 {
            let listener = CountingListener::new(&format!("l{}", i)).slow(Duration::from_millis(50));
            channel.on(Arc::new(listener)).await;
        }

        let start = tokio::time::Instant::now();
        channel.emit(&Signal).await;

        // 순차 실행이라면 200ms 이상
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_others() {
        let channel = EventedChannel::new("test");
        let bad = Arc::new(CountingListener::new("bad").failing());
        let good = Arc::new(CountingListener::new("good").slow(Duration::from_millis(10)));

        channel.on(bad.clone()).await;
        channel.on(good.clone()).await;

        let report = channel.emit(&Signal).await;

        assert!(!report.is_success());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(good.call_count(), 1);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "bad");
        assert!(matches!(failures[0].result, Err(Error::Listener { .. })));
    }

    #[tokio::test]
    async fn test_panic_is_reported_per_listener() {
        let channel = EventedChannel::new("test");
        let boom = Arc::new(CountingListener::new("boom").panicking());
        let good = Arc::new(CountingListener::new("good").slow(Duration::from_millis(10)));

        channel.on(boom.clone()).await;
        channel.on(good.clone()).await;

        let report = channel.emit(&Signal).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(good.call_count(), 1);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "boom");
        match &failures[0].result {
            Err(Error::Listener { listener, message }) => {
                assert_eq!(listener, "boom");
                assert!(message.contains("listener boom blew up"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_once_listener_is_drained() {
        let channel = EventedChannel::new("test");
        let once = Arc::new(CountingListener::new("once"));
        let persistent = Arc::new(CountingListener::new("persistent"));

        channel.once(once.clone()).await;
        channel.on(persistent.clone()).await;
        assert_eq!(channel.listener_count().await, 2);

        channel.emit(&Signal).await;
        let second = channel.emit(&Signal).await;

        assert_eq!(once.call_count(), 1);
        assert_eq!(persistent.call_count(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(channel.listener_count().await, 1);
        assert_eq!(channel.emission_count(), 2);
    }

    #[tokio::test]
    async fn test_off_removes_listener() {
        let channel = EventedChannel::new("test");
        let id = channel.on(Arc::new(CountingListener::new("a"))).await;

        assert!(channel.off(id).await);
        assert!(!channel.off(id).await);

        let report = channel.emit(&Signal).await;
        assert!(report.is_empty());
        assert!(report.is_success());
    }
}
