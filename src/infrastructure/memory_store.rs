//! 内存产品存储

use std::sync::RwLock;

use crate::app::product::{
    model::{Product, ProductChanges, ProductFilter, StockChange},
    store::ProductStore,
};
use crate::core::error::CoreError;

/// 进程内的有序产品集合，所有写操作串行化在同一把写锁下
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }
}

fn position(products: &[Product], id: &str) -> Result<usize, CoreError> {
    products
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| CoreError::product_not_found(id))
}

impl ProductStore for InMemoryProductStore {
    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, CoreError> {
        let products = self.products.read()?;
        Ok(products
            .iter()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> Result<Product, CoreError> {
        let products = self.products.read()?;
        let index = position(&products, id)?;
        Ok(products[index].clone())
    }

    fn insert(&self, product: Product) -> Result<Product, CoreError> {
        let mut products = self.products.write()?;
        if products.iter().any(|p| p.id == product.id) {
            return Err(CoreError::Internal(format!(
                "duplicate product id {}",
                product.id
            )));
        }
        products.push(product.clone());
        Ok(product)
    }

    fn update(&self, id: &str, changes: ProductChanges) -> Result<Product, CoreError> {
        let mut products = self.products.write()?;
        let index = position(&products, id)?;
        let product = &mut products[index];
        product.apply(changes);
        Ok(product.clone())
    }

    fn remove(&self, id: &str) -> Result<Product, CoreError> {
        let mut products = self.products.write()?;
        let index = position(&products, id)?;
        Ok(products.remove(index))
    }

    fn adjust_stock(&self, id: &str, delta: i64) -> Result<StockChange, CoreError> {
        let mut products = self.products.write()?;
        let index = position(&products, id)?;
        let product = &mut products[index];

        let previous_stock = product.stock;
        let new_stock = previous_stock
            .checked_add(delta)
            .ok_or_else(|| CoreError::validation("quantity", "quantity is out of range"))?;
        if new_stock < 0 {
            return Err(CoreError::InsufficientStock {
                available: previous_stock,
                requested: delta,
            });
        }

        product.stock = new_stock;
        product.touch();

        Ok(StockChange {
            product_id: product.id.clone(),
            previous_stock,
            current_stock: new_stock,
            quantity_changed: delta,
        })
    }

    fn count(&self) -> Result<usize, CoreError> {
        Ok(self.products.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::product::model::{sample_products, NewProduct};
    use std::sync::Arc;
    use std::thread;

    fn store() -> InMemoryProductStore {
        InMemoryProductStore::with_products(sample_products())
    }

    fn pen() -> Product {
        Product::create(NewProduct {
            name: "Pen".to_string(),
            description: "Blue ink".to_string(),
            price: 1.5,
            category: "Office".to_string(),
            stock: 10,
        })
    }

    #[test]
    fn test_insert_preserves_order() {
        let store = store();
        let pen = store.insert(pen()).unwrap();

        let all = store.list(&ProductFilter::default()).unwrap();
        let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", pen.id.as_str()]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        assert!(matches!(store().get("404"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_remove_then_get() {
        let store = store();
        let removed = store.remove("1").unwrap();
        assert_eq!(removed.name, "Laptop");
        assert!(matches!(store.get("1"), Err(CoreError::NotFound(_))));
        assert!(matches!(store.remove("1"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_update_sets_updated_at() {
        let store = store();
        let updated = store
            .update(
                "2",
                ProductChanges {
                    stock: Some(7),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.stock, 7);
        assert!(updated.updated_at.is_some());
        assert_eq!(store.get("2").unwrap(), updated);
    }

    #[test]
    fn test_adjust_stock_rejects_negative_result() {
        let store = store();
        let before = store.get("1").unwrap();

        let err = store.adjust_stock("1", -51).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 50,
                requested: -51
            }
        ));
        assert_eq!(store.get("1").unwrap(), before);

        let change = store.adjust_stock("1", -50).unwrap();
        assert_eq!(change.previous_stock, 50);
        assert_eq!(change.current_stock, 0);
        assert_eq!(change.quantity_changed, -50);
    }

    #[test]
    fn test_adjust_stock_overflow() {
        let store = store();
        assert!(matches!(
            store.adjust_stock("1", i64::MAX),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn test_concurrent_adjustments_are_not_lost() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.adjust_stock("2", 1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get("2").unwrap().stock, 100 + 800);
    }
}
