#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the repeating timer library.
//! 重复定时器库的根。
//!
//! This crate composes a primitive single-shot asynchronous timer into a
//! periodic-callback scheduler with start/stop/change-interval semantics.
//!
//! 本库将原始的单次异步定时器组合成一个具有启动/停止/变更间隔语义的
//! 周期性回调调度器。

pub mod error;
pub mod oneshot;
pub mod timer;

pub use error::{Error, Result};
pub use oneshot::{OneshotTimer, TokioOneshotTimer, WaitStatus};
pub use timer::{HandlerPanicHook, RepeatingTimer, TickHandler};
