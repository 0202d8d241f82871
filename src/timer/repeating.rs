//! 重复定时器门面
//! Repeating Timer Facade
//!
//! 绑定到执行上下文的公共入口。同一时刻最多拥有一个活跃的引擎和一个
//! 活跃的处理器，二者作为一个整体在锁下被原子地替换或清除。
//!
//! The public entry point bound to an execution context. Owns at most one
//! active engine and one active handler at a time; the pair is atomically
//! replaced or cleared as a unit, under the lock.

use crate::error::{Error, Result};
use crate::oneshot::{OneshotTimer, TokioOneshotTimer};
use crate::timer::{
    engine::InternalTimer,
    handler::{HandlerPanicHook, TickHandler},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::debug;

/// A periodic-callback timer with start/stop/change-interval semantics,
/// composed from a single-shot timer primitive.
///
/// 由单次定时器原语组合而成、具有启动/停止/变更间隔语义的周期性回调
/// 定时器。
///
/// After `stop` returns, no new firing occurs; one firing that was already
/// past the point of invoking the handler may still complete concurrently
/// with the `stop` call.
///
/// `stop` 返回后不会再有新的触发；一次已经越过“调用处理器”时点的触发
/// 可能与 `stop` 调用并发地完成。
pub struct RepeatingTimer<T: OneshotTimer = TokioOneshotTimer> {
    /// Constructs one fresh single-shot timer per `start`, bound to the
    /// execution context this facade was created with.
    ///
    /// 每次 `start` 构造一个新的单次定时器，绑定到创建本门面时的执行
    /// 上下文。
    factory: Box<dyn Fn() -> T + Send + Sync>,
    /// The (engine, handler) pair. Set and cleared together; never one
    /// without the other.
    ///
    /// （引擎，处理器）对。一起设置、一起清除；绝不单独存在。
    active: Mutex<Option<Active<T>>>,
    panic_hook: Option<HandlerPanicHook>,
}

struct Active<T: OneshotTimer> {
    engine: Arc<InternalTimer<T>>,
    handler: Arc<dyn TickHandler>,
}

impl RepeatingTimer {
    /// Creates a timer bound to the current tokio runtime.
    /// 创建绑定到当前 tokio 运行时的定时器。
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, as `Handle::current` does.
    /// 在 tokio 运行时之外调用时会 panic，与 `Handle::current` 一致。
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Creates a timer bound to the given runtime handle.
    /// 创建绑定到给定运行时句柄的定时器。
    pub fn with_handle(handle: Handle) -> Self {
        Self::with_timer_factory(move || TokioOneshotTimer::new(handle.clone()))
    }
}

impl<T: OneshotTimer> RepeatingTimer<T> {
    /// Creates a timer over an arbitrary single-shot timer source.
    /// 基于任意单次定时器来源创建定时器。
    pub fn with_timer_factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            active: Mutex::new(None),
            panic_hook: None,
        }
    }

    /// Installs a diagnostic sink invoked whenever a handler panic is
    /// caught and discarded at the engine boundary.
    ///
    /// 安装诊断接收器，在处理器 panic 于引擎边界被捕获并丢弃时调用。
    pub fn with_panic_hook(mut self, hook: HandlerPanicHook) -> Self {
        self.panic_hook = Some(hook);
        self
    }

    /// Begins (or atomically restarts) periodic firing.
    /// 开始（或原子地重启）周期性触发。
    ///
    /// Any previously running cycle is replaced unconditionally: its handler
    /// is revoked and its outstanding wait cancelled before the new engine
    /// is armed. A zero interval is permitted and fires as fast as the
    /// execution context can cycle.
    ///
    /// 任何先前运行的周期都会被无条件替换：在新引擎被武装之前，其处理器
    /// 被撤销、未完成的等待被取消。允许零间隔，它会以执行上下文所能循环
    /// 的最快速度触发。
    ///
    /// # Errors
    /// [`Error::IntervalOutOfRange`] when `now + interval` is not
    /// representable as a deadline.
    pub fn start<H: TickHandler>(&self, interval: Duration, handler: H) -> Result<()> {
        if Instant::now().checked_add(interval).is_none() {
            return Err(Error::IntervalOutOfRange(interval));
        }

        let mut active = self.active();
        Self::revoke(&mut active);

        debug!(?interval, "starting repeating timer");
        let handler: Arc<dyn TickHandler> = Arc::new(handler);
        let engine = InternalTimer::spawn(
            (self.factory)(),
            interval,
            &handler,
            self.panic_hook.clone(),
        );
        *active = Some(Active { engine, handler });
        Ok(())
    }

    /// Halts periodic firing. Idempotent; a no-op on a stopped or
    /// never-started timer.
    ///
    /// 停止周期性触发。幂等；对已停止或从未启动的定时器是安全的空操作。
    pub fn stop(&self) {
        Self::revoke(&mut self.active());
    }

    /// Alias of [`stop`](Self::stop).
    /// [`stop`](Self::stop) 的别名。
    pub fn cancel(&self) {
        self.stop();
    }

    /// Retunes the period for future ticks. Takes effect on the next
    /// re-arm; never affects a wait already submitted. A no-op when no
    /// cycle is running.
    ///
    /// 为未来的滴答重新调整周期。在下一次重新武装时生效；从不影响已提交
    /// 的等待。没有运行中的周期时是空操作。
    pub fn change_interval(&self, interval: Duration) {
        if let Some(active) = self.active().as_ref() {
            debug!(?interval, "changing repeating timer interval");
            active.engine.change_interval(interval);
        }
    }

    /// Whether a cycle is currently installed.
    /// 当前是否安装了运行中的周期。
    pub fn is_running(&self) -> bool {
        self.active().is_some()
    }

    fn active(&self) -> MutexGuard<'_, Option<Active<T>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Revokes the handler before cancelling the wait, so the cancelled
    /// wait's completion callback finds the handler already gone and does
    /// not deliver `Cancelled` to it.
    ///
    /// 先撤销处理器再取消等待，使被取消等待的完成回调发现处理器已不在，
    /// 从而不会向其投递 `Cancelled`。
    fn revoke(active: &mut Option<Active<T>>) {
        if let Some(Active { engine, handler }) = active.take() {
            debug!("revoking active repeating timer cycle");
            drop(handler);
            engine.cancel();
        }
    }
}

impl<T: OneshotTimer> Drop for RepeatingTimer<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: OneshotTimer> std::fmt::Debug for RepeatingTimer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTimer")
            .field("running", &self.is_running())
            .finish()
    }
}
