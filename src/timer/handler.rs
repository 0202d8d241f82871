//! 滴答处理器能力
//! Tick Handler Capability
//!
//! 门面以所有权语义持有处理器（`Arc<dyn TickHandler>`），引擎以
//! 非所有权语义观察它（`Weak`）。弱引用升级失败即为“本轮已被撤销”
//! 的信号。
//!
//! The facade owns the handler (`Arc<dyn TickHandler>`); the engine
//! observes it non-owningly (`Weak`). A failed weak upgrade is the
//! "this round has been revoked" signal.

use crate::oneshot::WaitStatus;
use std::any::Any;
use std::sync::Arc;

/// A handler invoked once per tick with the completion status of the wait
/// that produced the tick.
///
/// 每个滴答调用一次的处理器，参数为产生该滴答的等待的完成状态。
///
/// Handlers must tolerate repeated invocation (once per tick) and make no
/// assumption about thread identity beyond "a completion thread of the
/// execution context". A handler may call back into the timer's own control
/// surface (`stop`, `change_interval`, even `start`) from inside its own
/// invocation.
///
/// 处理器必须容忍重复调用（每个滴答一次），且除了“执行上下文的某个完成
/// 线程”之外不得对线程身份做任何假设。处理器可以在自身调用内部回调定时器
/// 自己的控制面（`stop`、`change_interval`，甚至 `start`）。
pub trait TickHandler: Send + Sync + 'static {
    /// Invoked once per firing of the underlying single-shot timer.
    /// 底层单次定时器每触发一次调用一次。
    fn on_tick(&self, status: WaitStatus);
}

impl<F> TickHandler for F
where
    F: Fn(WaitStatus) + Send + Sync + 'static,
{
    fn on_tick(&self, status: WaitStatus) {
        self(status)
    }
}

/// Diagnostic sink for handler panics.
///
/// 处理器 panic 的诊断接收器。
///
/// A panic raised by a handler is caught at the engine boundary so that it
/// cannot destabilize the execution context's completion thread. The caught
/// payload is logged and, when a hook is installed, forwarded here instead
/// of being silently discarded.
///
/// 处理器抛出的 panic 会在引擎边界被捕获，从而不会破坏执行上下文的完成
/// 线程。被捕获的载荷会被记录日志，且在安装了钩子时被转发到这里，而不是
/// 被静默丢弃。
pub type HandlerPanicHook = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;
