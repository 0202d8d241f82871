//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use std::time::Duration;
use thiserror::Error;

/// The primary error type for the repeating timer library.
/// 重复定时器库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The requested interval cannot be represented as a deadline on the
    /// host clock (now + interval overflows the instant type).
    ///
    /// 请求的间隔无法在宿主时钟上表示为截止时间（now + interval 溢出）。
    #[error("interval of {0:?} is not representable as a deadline")]
    IntervalOutOfRange(Duration),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
