//! 重复定时器模块
//! Repeating Timer Module
//!
//! 该模块将单次定时器原语组合成一个周期性回调调度器。核心是
//! `engine` 中的自重排状态机：同一时刻只拥有一个未完成的等待，
//! 在自己的完成回调内部安全地重新武装自己，并将启动/停止/间隔变更
//! 与并发的完成回调串行化。
//!
//! This module composes the single-shot timer primitive into a periodic
//! callback scheduler. The core is the self-rescheduling state machine in
//! `engine`: it owns one outstanding wait at a time, safely re-arms itself
//! from inside its own completion callback, and serializes
//! start/stop/interval changes against concurrent completions.

pub mod handler;
pub mod repeating;

pub(crate) mod engine;


pub use handler::{HandlerPanicHook, TickHandler};
pub use repeating::RepeatingTimer;
