//! 产品存储抽象

use super::model::{Product, ProductChanges, ProductFilter, StockChange};
use crate::core::error::CoreError;

/// 产品存储接口，内存实现之外可以替换为数据库
///
/// 实现需要保证：id 创建后不变，库存永不为负，
/// 读-改-写操作（`update`、`adjust_stock`）对并发请求是原子的。
pub trait ProductStore: Send + Sync {
    /// 按插入顺序返回匹配的产品
    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, CoreError>;

    fn get(&self, id: &str) -> Result<Product, CoreError>;

    fn insert(&self, product: Product) -> Result<Product, CoreError>;

    fn update(&self, id: &str, changes: ProductChanges) -> Result<Product, CoreError>;

    /// 删除并返回被删除的产品
    fn remove(&self, id: &str) -> Result<Product, CoreError>;

    /// 库存加上 `delta`，结果为负时返回 `InsufficientStock` 且不修改
    fn adjust_stock(&self, id: &str, delta: i64) -> Result<StockChange, CoreError>;

    fn count(&self) -> Result<usize, CoreError>;
}
