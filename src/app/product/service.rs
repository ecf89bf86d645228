//! 产品业务服务

use std::sync::Arc;
use tracing::info;

use super::{
    model::{NewProduct, Product, ProductChanges, ProductFilter, StockChange},
    store::ProductStore,
};
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CoreError> {
        let products = self.store.list(filter)?;
        info!("查询到 {} 个产品", products.len());
        Ok(products)
    }

    pub fn get_product(&self, id: &str) -> Result<Product, CoreError> {
        let product = self.store.get(id)?;
        info!("获取产品 {}", id);
        Ok(product)
    }

    /// 只检查产品是否存在，不记录日志
    pub fn ensure_exists(&self, id: &str) -> Result<(), CoreError> {
        self.store.get(id).map(|_| ())
    }

    pub fn create_product(&self, new: NewProduct) -> Result<Product, CoreError> {
        let product = self.store.insert(Product::create(new))?;
        info!("创建产品 {}", product.id);
        Ok(product)
    }

    pub fn update_product(&self, id: &str, changes: ProductChanges) -> Result<Product, CoreError> {
        let product = self.store.update(id, changes)?;
        info!("更新产品 {}", id);
        Ok(product)
    }

    pub fn delete_product(&self, id: &str) -> Result<Product, CoreError> {
        let product = self.store.remove(id)?;
        info!("删除产品 {}", id);
        Ok(product)
    }

    pub fn adjust_stock(&self, id: &str, quantity: i64) -> Result<StockChange, CoreError> {
        let change = self.store.adjust_stock(id, quantity)?;
        info!(
            "产品 {} 库存变更 {}: {} -> {}",
            id, quantity, change.previous_stock, change.current_stock
        );
        Ok(change)
    }

    pub fn product_count(&self) -> Result<usize, CoreError> {
        self.store.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::product::model::sample_products;
    use crate::infrastructure::memory_store::InMemoryProductStore;
    use std::collections::HashSet;

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryProductStore::with_products(
            sample_products(),
        )))
    }

    fn new_product(category: &str, price: f64) -> NewProduct {
        NewProduct {
            name: "Item".to_string(),
            description: "Test item".to_string(),
            price,
            category: category.to_string(),
            stock: 1,
        }
    }

    #[test]
    fn test_created_ids_are_unique() {
        let service = service();
        let mut seen: HashSet<String> = service
            .list_products(&ProductFilter::default())
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        for _ in 0..20 {
            let product = service.create_product(new_product("Books", 5.0)).unwrap();
            assert!(seen.insert(product.id));
            assert!(product.updated_at.is_none());
        }
        assert_eq!(service.product_count().unwrap(), 22);
    }

    #[test]
    fn test_list_with_filters() {
        let service = service();
        service.create_product(new_product("books", 12.0)).unwrap();
        service.create_product(new_product("Books", 30.0)).unwrap();

        let filter = ProductFilter {
            category: Some("BOOKS".to_string()),
            min_price: Some(12.0),
            max_price: Some(20.0),
        };
        let books = service.list_products(&filter).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].price, 12.0);
    }

    #[test]
    fn test_ensure_exists() {
        let service = service();
        assert!(service.ensure_exists("1").is_ok());
        assert!(matches!(
            service.ensure_exists("missing"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let service = service();
        service.delete_product("2").unwrap();
        assert!(matches!(
            service.get_product("2"),
            Err(CoreError::NotFound(_))
        ));
    }
}
