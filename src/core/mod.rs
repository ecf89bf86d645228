//! 核心层：错误处理、响应、中间件、限流与指标

pub mod error;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod response;
