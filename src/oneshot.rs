//! 单次定时器原语契约
//! Single-Shot Timer Primitive Contract
//!
//! 该模块定义了重复定时器所消费的单次定时器抽象。引擎从不自己计时，
//! 它只通过这个窄契约与执行底座交互。
//!
//! This module defines the single-shot timer abstraction consumed by the
//! repeating timer. The engine never keeps time itself; it interacts with
//! the execution substrate only through this narrow contract.

pub mod driver;

pub use driver::TokioOneshotTimer;

use std::time::Duration;

/// Completion status of a single wait, delivered to the wait callback and,
/// from there, to the tick handler.
///
/// 单次等待的完成状态，传递给等待回调，进而传递给滴答处理器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The deadline elapsed normally.
    /// 截止时间正常到期。
    Elapsed,
    /// The wait was cancelled, or the execution substrate is shutting down.
    /// 等待被取消，或执行底座正在关闭。
    Cancelled,
}

impl WaitStatus {
    /// Whether the wait completed by elapsing rather than by cancellation.
    /// 等待是否因到期（而非取消）而完成。
    pub fn is_elapsed(self) -> bool {
        matches!(self, WaitStatus::Elapsed)
    }
}

/// The completion callback submitted with each wait. Invoked exactly once
/// per submission.
///
/// 随每次等待提交的完成回调。每次提交恰好被调用一次。
pub type WaitCallback = Box<dyn FnOnce(WaitStatus) + Send + 'static>;

/// A single-shot asynchronous timer bound to an execution context.
///
/// 绑定到执行上下文的单次异步定时器。
///
/// Contract:
/// - `async_wait` invokes its callback exactly once, with [`WaitStatus::Elapsed`]
///   when the deadline set by `expires_from_now` passes, or with
///   [`WaitStatus::Cancelled`] after `cancel` is called.
/// - `cancel` is best-effort: a pending wait still invokes its callback
///   (with `Cancelled`) rather than being silently dropped.
/// - Callers never have more than one wait outstanding per instance.
///
/// 契约：
/// - `async_wait` 恰好调用其回调一次：截止时间到期时以 [`WaitStatus::Elapsed`]，
///   `cancel` 被调用后以 [`WaitStatus::Cancelled`]。
/// - `cancel` 是尽力而为的：挂起的等待仍会调用其回调（以 `Cancelled`），
///   而不是被静默丢弃。
/// - 调用者在每个实例上同一时刻最多只有一个未完成的等待。
pub trait OneshotTimer: Send + Sync + 'static {
    /// Sets the deadline to `now + delay`. Does not affect an already
    /// submitted wait.
    ///
    /// 将截止时间设置为 `now + delay`。不影响已提交的等待。
    fn expires_from_now(&self, delay: Duration);

    /// Submits one wait against the current deadline.
    /// 针对当前截止时间提交一次等待。
    fn async_wait(&self, callback: WaitCallback);

    /// Requests cancellation of the outstanding wait, if any.
    /// 请求取消未完成的等待（如果有）。
    fn cancel(&self);
}
