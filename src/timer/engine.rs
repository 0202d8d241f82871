//! 自重排定时器引擎
//! Self-Rescheduling Timer Engine
//!
//! `InternalTimer` 包装一个单次定时器实例，并在自己的完成回调内部
//! 重新武装自己。未完成的等待本身持有引擎的强引用，因此引擎可以在
//! 门面撤销它之后再存活一次完成回调的往返；但一旦处理器的弱引用无法
//! 升级，它绝不会再次武装。
//!
//! `InternalTimer` wraps one single-shot timer instance and re-arms itself
//! from inside its own completion callback. The outstanding wait itself
//! holds a strong reference to the engine, so the engine may outlive the
//! facade's reference for one round-trip through the execution context;
//! but it never re-arms once the handler's weak reference fails to upgrade.
//!
//! 状态机 / State machine:
//! Idle → Scheduled → Firing → (Scheduled | Retired)

use crate::oneshot::{OneshotTimer, WaitStatus};
use crate::timer::handler::{HandlerPanicHook, TickHandler};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{trace, warn};

pub(crate) struct InternalTimer<T: OneshotTimer> {
    /// The wrapped single-shot timer. At most one `async_wait` is
    /// outstanding on it at any instant.
    ///
    /// 被包装的单次定时器。任一时刻其上最多有一个未完成的 `async_wait`。
    timer: T,
    /// Non-owning reference to the handler, set once at construction.
    /// A failed upgrade means the facade has revoked this engine.
    ///
    /// 对处理器的非所有权引用，在构造时设置一次。
    /// 升级失败意味着门面已撤销此引擎。
    handler: Weak<dyn TickHandler>,
    /// Current interval. The lock doubles as the serialization point
    /// between a facade-side `cancel`/`change_interval` and a re-arm
    /// decision being made inside the completion callback.
    ///
    /// 当前间隔。该锁同时充当门面侧 `cancel`/`change_interval` 与
    /// 完成回调内部重新武装决策之间的串行化点。
    interval: Mutex<Duration>,
    /// Optional sink for discarded handler panics.
    /// 被丢弃的处理器 panic 的可选接收器。
    panic_hook: Option<HandlerPanicHook>,
}

impl<T: OneshotTimer> InternalTimer<T> {
    /// Creates the engine and arms it exactly once. This is the only path
    /// that submits the first wait; every later wait is submitted by the
    /// completion callback itself.
    ///
    /// 创建引擎并恰好武装一次。这是提交第一次等待的唯一路径；
    /// 之后的每次等待都由完成回调自己提交。
    pub(crate) fn spawn(
        timer: T,
        interval: Duration,
        handler: &Arc<dyn TickHandler>,
        panic_hook: Option<HandlerPanicHook>,
    ) -> Arc<Self> {
        let engine = Arc::new(Self {
            timer,
            handler: Arc::downgrade(handler),
            interval: Mutex::new(interval),
            panic_hook,
        });
        engine.arm();
        engine
    }

    /// Requests cancellation of the outstanding wait. Best-effort: a
    /// completion callback already executing will still run, find the
    /// handler revoked, and retire instead of re-arming.
    ///
    /// 请求取消未完成的等待。尽力而为：已在执行的完成回调仍会运行，
    /// 发现处理器已被撤销后自行退休而不再武装。
    pub(crate) fn cancel(&self) {
        let _interval = self.interval();
        self.timer.cancel();
    }

    /// Overwrites the stored interval. Never touches the currently
    /// outstanding wait; observed by the next re-arm only.
    ///
    /// 覆写存储的间隔。从不触碰当前未完成的等待；仅被下一次重新武装观察到。
    pub(crate) fn change_interval(&self, interval: Duration) {
        *self.interval() = interval;
    }

    fn interval(&self) -> MutexGuard<'_, Duration> {
        self.interval.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle → Scheduled: submits the first wait against the current
    /// interval.
    ///
    /// Idle → Scheduled：按当前间隔提交第一次等待。
    fn arm(self: &Arc<Self>) {
        let guard = self.interval();
        self.arm_locked(&guard);
    }

    /// Submits one wait against the current interval, handing the wait a
    /// strong reference to this engine. The caller must hold the interval
    /// lock: a facade-side `cancel` then either precedes the caller's
    /// revocation check (the upgrade fails) or follows the submission and
    /// cancels the fresh wait.
    ///
    /// 按当前间隔提交一次等待，并将本引擎的一个强引用交给该等待。
    /// 调用者必须持有间隔锁：门面侧的 `cancel` 要么先于调用者的撤销检查
    /// （升级失败），要么在提交之后发生并取消这个新等待。
    fn arm_locked(self: &Arc<Self>, guard: &MutexGuard<'_, Duration>) {
        trace!(interval = ?**guard, "arming one-shot wait");
        self.timer.expires_from_now(**guard);
        let engine = Arc::clone(self);
        self.timer
            .async_wait(Box::new(move |status| engine.handle_timeout(status)));
    }

    /// Scheduled → Firing → (Scheduled | Retired): the completion callback.
    ///
    /// Scheduled → Firing → (Scheduled | Retired)：完成回调。
    ///
    /// The handler is invoked while no lock is held, so a handler may call
    /// back into `stop`/`change_interval`/`start` synchronously without
    /// deadlocking.
    ///
    /// 调用处理器时不持有任何锁，因此处理器可以同步回调
    /// `stop`/`change_interval`/`start` 而不会死锁。
    fn handle_timeout(self: Arc<Self>, status: WaitStatus) {
        if let Some(handler) = self.handler.upgrade() {
            trace!(?status, "invoking tick handler");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_tick(status)));
            if let Err(payload) = outcome {
                warn!("tick handler panicked; discarding the panic");
                if let Some(hook) = &self.panic_hook {
                    hook(payload);
                }
            }
        }
        // The temporary strong reference from the upgrade above is gone
        // here; a facade-side revoke that happened during the invocation is
        // now visible as a failed upgrade. The re-check and the re-submit
        // form one critical section under the interval lock, so a `cancel`
        // either precedes the check or lands on the freshly submitted wait.
        if status.is_elapsed() {
            let guard = self.interval();
            if self.handler.upgrade().is_some() {
                self.arm_locked(&guard);
                return;
            }
        }
        trace!(?status, "engine retired, no re-arm");
    }
}

impl<T: OneshotTimer> std::fmt::Debug for InternalTimer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalTimer")
            .field("interval", &*self.interval())
            .field("handler_alive", &(self.handler.strong_count() > 0))
            .finish()
    }
}
