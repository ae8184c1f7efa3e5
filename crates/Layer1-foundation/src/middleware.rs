//! Middleware - 옵션을 감싸는 미들웨어 래퍼
//!
//! `(ctx, next, options)`를 받는 핸들러를 옵션 → 미들웨어 팩토리로 바꿉니다.
//! 옵션은 팩토리 호출 시점에 캡처되고, 미들웨어가 실행될 때마다 복제되어 전달됩니다.

use crate::Result;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// 미들웨어: 컨텍스트와 다음 단계를 받아 실행
pub type Middleware<C> = Arc<dyn Fn(C, Next<C>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// 체인의 다음 단계
pub struct Next<C> {
    chain: Arc<[Middleware<C>]>,
    index: usize,
}

impl<C: Send + 'static> Next<C> {
    /// 다음 미들웨어 실행 (끝이면 즉시 완료)
    pub fn run(self, ctx: C) -> BoxFuture<'static, Result<()>> {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = Next {
                    chain: Arc::clone(&self.chain),
                    index: self.index + 1,
                };
                middleware(ctx, next)
            }
            None => Box::pin(async { Ok(()) }),
        }
    }

    /// 남은 미들웨어 수
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

/// 핸들러를 옵션 → 미들웨어 팩토리로 변환
///
/// ```ignore
/// let logger = wrap_middleware(|ctx: Ctx, next, prefix: String| async move {
///     ctx.log(&prefix);
///     next.run(ctx).await
/// });
///
/// chain.push(logger("[req]".to_string()));
/// ```
pub fn wrap_middleware<C, O, F, Fut>(handler: F) -> impl Fn(O) -> Middleware<C>
where
    C: Send + 'static,
    O: Clone + Send + Sync + 'static,
    F: Fn(C, Next<C>, O) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let handler = Arc::new(handler);
    move |options: O| {
        let handler = Arc::clone(&handler);
        let middleware: Middleware<C> = Arc::new(move |ctx: C, next: Next<C>| {
            let fut: BoxFuture<'static, Result<()>> = Box::pin(handler(ctx, next, options.clone()));
            fut
        });
        middleware
    }
}

/// 순서대로 실행되는 미들웨어 체인
pub struct MiddlewareChain<C> {
    middlewares: Vec<Middleware<C>>,
}

impl<C: Send + 'static> MiddlewareChain<C> {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// 미들웨어 추가
    pub fn push(&mut self, middleware: Middleware<C>) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// 체인 실행
    pub async fn run(&self, ctx: C) -> Result<()> {
        let chain: Arc<[Middleware<C>]> = self.middlewares.clone().into();
        Next { chain, index: 0 }.run(ctx).await
    }
}

impl<C: Send + 'static> Default for MiddlewareChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use support::Trace;

    /// 테스트용 실행 기록
    mod support {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        pub struct Trace(pub Arc<Mutex<Vec<String>>>);

        impl Trace {
            pub fn push(&self, entry: impl Into<String>) {
                self.0.lock().unwrap().push(entry.into());
            }

            pub fn entries(&self) -> Vec<String> {
                self.0.lock().unwrap().clone()
            }
        }
    }

    #[tokio::test]
    async fn test_options_are_captured_per_factory_call() {
        let tag = wrap_middleware(|trace: Trace, next: Next<Trace>, label: String| async move {
            trace.push(format!("enter {}", label));
            let result = next.run(trace.clone()).await;
            trace.push(format!("leave {}", label));
            result
        });

        let mut chain = MiddlewareChain::new();
        chain.push(tag("outer".to_string()));
        chain.push(tag("inner".to_string()));

        let trace = Trace::default();
        chain.run(trace.clone()).await.unwrap();

        assert_eq!(
            trace.entries(),
            vec!["enter outer", "enter inner", "leave inner", "leave outer"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_on_error() {
        let fail = wrap_middleware(|_trace: Trace, _next: Next<Trace>, reason: &'static str| async move {
            Err::<(), Error>(Error::InvalidInput(reason.to_string()))
        });
        let record = wrap_middleware(|trace: Trace, next: Next<Trace>, _: ()| async move {
            trace.push("reached");
            next.run(trace).await
        });

        let mut chain = MiddlewareChain::new();
        chain.push(fail("blocked")).push(record(()));

        let trace = Trace::default();
        let err = chain.run(trace.clone()).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(ref r) if r == "blocked"));
        assert!(trace.entries().is_empty());
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain: MiddlewareChain<Trace> = MiddlewareChain::new();
        assert!(chain.is_empty());
        chain.run(Trace::default()).await.unwrap();
    }
}
