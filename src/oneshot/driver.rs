//! 基于 Tokio 的单次定时器实现
//! Tokio-Backed Single-Shot Timer Implementation
//!
//! 每次 `async_wait` 在绑定的运行时上派生一个任务，该任务让
//! `sleep_until(截止时间)` 与一个取消通知竞争，然后恰好调用一次回调。
//!
//! Each `async_wait` spawns one task on the bound runtime that races
//! `sleep_until(deadline)` against a cancellation notification and then
//! invokes the callback exactly once.

use super::{OneshotTimer, WaitCallback, WaitStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::{
    runtime::Handle,
    sync::Notify,
    time::{Instant, sleep_until},
};
use tracing::trace;

/// Deadline fallback when `now + delay` overflows the instant type.
/// 当 `now + delay` 溢出时的截止时间回退值。
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A [`OneshotTimer`] driven by `tokio::time`, bound to a runtime handle.
///
/// 由 `tokio::time` 驱动、绑定到运行时句柄的 [`OneshotTimer`]。
pub struct TokioOneshotTimer {
    handle: Handle,
    /// Shared with the spawned wait task, which clears its own entry from
    /// `active` once the race resolves.
    ///
    /// 与派生的等待任务共享；竞争一旦决出，任务会清除自己在 `active`
    /// 中的条目。
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    /// Absolute deadline for the next wait.
    /// 下一次等待的绝对截止时间。
    deadline: Instant,
    /// Cancellation signal for the currently outstanding wait. A fresh
    /// `Notify` is created per submission so that a stale cancel permit can
    /// never leak into a later wait.
    ///
    /// 当前未完成等待的取消信号。每次提交都会创建一个新的 `Notify`，
    /// 这样过期的取消许可永远不会泄漏到后续的等待中。
    active: Option<Arc<Notify>>,
}

impl TokioOneshotTimer {
    /// Creates a timer bound to the given runtime handle.
    /// 创建绑定到给定运行时句柄的定时器。
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            inner: Arc::new(Mutex::new(Inner {
                deadline: Instant::now(),
                active: None,
            })),
        }
    }

    /// Creates a timer bound to the current runtime.
    /// 创建绑定到当前运行时的定时器。
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, as `Handle::current` does.
    /// 在 tokio 运行时之外调用时会 panic，与 `Handle::current` 一致。
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OneshotTimer for TokioOneshotTimer {
    fn expires_from_now(&self, delay: Duration) {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.inner().deadline = deadline;
    }

    fn async_wait(&self, callback: WaitCallback) {
        let notify = Arc::new(Notify::new());
        let shared = self.inner.clone();
        let deadline = {
            let mut inner = self.inner();
            inner.active = Some(notify.clone());
            inner.deadline
        };

        // The wait task is abandoned (callback never runs) only if the
        // runtime itself is torn down before the race resolves.
        self.handle.spawn(async move {
            let status = tokio::select! {
                _ = sleep_until(deadline) => WaitStatus::Elapsed,
                _ = notify.notified() => WaitStatus::Cancelled,
            };
            // Clear our own entry before the callback runs; the `ptr_eq`
            // guard keeps a successor wait submitted by the callback (or a
            // concurrent `cancel` that already took the slot) untouched.
            {
                let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if inner
                    .active
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &notify))
                {
                    inner.active = None;
                }
            }
            trace!(?status, "one-shot wait resolved");
            callback(status);
        });
    }

    fn cancel(&self) {
        // notify_one stores a permit, so a cancel that lands before the
        // spawned task first polls `notified()` is still observed.
        if let Some(notify) = self.inner().active.take() {
            trace!("cancelling outstanding one-shot wait");
            notify.notify_one();
        }
    }
}

impl std::fmt::Debug for TokioOneshotTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner();
        f.debug_struct("TokioOneshotTimer")
            .field("deadline", &inner.deadline)
            .field("wait_outstanding", &inner.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn submit(timer: &TokioOneshotTimer, delay: Duration) -> oneshot::Receiver<WaitStatus> {
        let (tx, rx) = oneshot::channel();
        timer.expires_from_now(delay);
        timer.async_wait(Box::new(move |status| {
            let _ = tx.send(status);
        }));
        rx
    }

    fn wait_outstanding(timer: &TokioOneshotTimer) -> bool {
        timer.inner().active.is_some()
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_wait_clears_its_outstanding_marker() {
        let timer = TokioOneshotTimer::current();
        let rx = submit(&timer, Duration::from_millis(10));
        assert!(wait_outstanding(&timer));

        assert_eq!(rx.await.unwrap(), WaitStatus::Elapsed);
        assert!(!wait_outstanding(&timer));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_resolution_does_not_disturb_the_next_wait() {
        let timer = TokioOneshotTimer::current();
        let rx = submit(&timer, Duration::from_millis(10));
        assert_eq!(rx.await.unwrap(), WaitStatus::Elapsed);

        // A no-op: the resolved wait already cleared its entry.
        timer.cancel();

        let rx = submit(&timer, Duration::from_millis(10));
        assert_eq!(rx.await.unwrap(), WaitStatus::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_poll_still_delivers_cancelled() {
        let timer = TokioOneshotTimer::current();
        let rx = submit(&timer, Duration::from_secs(3600));
        timer.cancel();
        assert_eq!(rx.await.unwrap(), WaitStatus::Cancelled);
    }
}
