//! 基础设施层：存储实现与日志

pub mod logger;
pub mod memory_store;
