//! 产品数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const PRICE_MESSAGE: &str = "price must be a positive number";
pub const STOCK_MESSAGE: &str = "stock must be a non-negative integer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// 由校验过的输入创建产品，分配新的 id 和创建时间
    pub fn create(new: NewProduct) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            stock: new.stock,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// 合并部分更新并刷新 `updated_at`，id 与创建时间保持不变
    pub fn apply(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(category) = &filter.category {
            if self.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(min_price) = filter.min_price {
            if self.price < min_price {
                return false;
            }
        }
        if let Some(max_price) = filter.max_price {
            if self.price > max_price {
                return false;
            }
        }
        true
    }
}

/// 创建产品的输入
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: f64,
    pub category: String,
    #[validate(range(min = 0, message = "stock must be a non-negative integer"))]
    pub stock: i64,
}

/// 部分更新，未提供的字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: Option<f64>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "stock must be a non-negative integer"))]
    pub stock: Option<i64>,
}

/// 列表过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// 库存调整结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockChange {
    pub product_id: String,
    pub previous_stock: i64,
    pub current_stock: i64,
    pub quantity_changed: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedProduct {
    pub id: String,
    pub message: String,
}

/// 启动时载入的示例产品
pub fn sample_products() -> Vec<Product> {
    let created_at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    vec![
        Product {
            id: "1".to_string(),
            name: "Laptop".to_string(),
            description: "High-performance laptop".to_string(),
            price: 999.99,
            category: "Electronics".to_string(),
            stock: 50,
            created_at,
            updated_at: None,
        },
        Product {
            id: "2".to_string(),
            name: "Smartphone".to_string(),
            description: "Latest smartphone".to_string(),
            price: 699.99,
            category: "Electronics".to_string(),
            stock: 100,
            created_at,
            updated_at: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop() -> Product {
        sample_products().remove(0)
    }

    #[test]
    fn test_filter_category_is_case_insensitive() {
        let filter = ProductFilter {
            category: Some("electronics".to_string()),
            ..Default::default()
        };
        assert!(laptop().matches(&filter));

        let filter = ProductFilter {
            category: Some("books".to_string()),
            ..Default::default()
        };
        assert!(!laptop().matches(&filter));
    }

    #[test]
    fn test_filter_price_bounds_are_inclusive() {
        let filter = ProductFilter {
            min_price: Some(999.99),
            max_price: Some(999.99),
            ..Default::default()
        };
        assert!(laptop().matches(&filter));

        let filter = ProductFilter {
            max_price: Some(999.98),
            ..Default::default()
        };
        assert!(!laptop().matches(&filter));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut product = laptop();
        let created_at = product.created_at;
        product.apply(ProductChanges {
            price: Some(10.0),
            ..Default::default()
        });

        assert_eq!(product.id, "1");
        assert_eq!(product.created_at, created_at);
        assert_eq!(product.price, 10.0);
        assert_eq!(product.name, "Laptop");
        assert!(product.updated_at.is_some());
    }

    #[test]
    fn test_validator_rules() {
        let new = NewProduct {
            name: "Pen".to_string(),
            description: "Blue".to_string(),
            price: 0.0,
            category: "Office".to_string(),
            stock: -1,
        };
        let errors = new.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("stock"));

        let changes = ProductChanges {
            name: Some("Pencil".to_string()),
            ..Default::default()
        };
        assert!(changes.validate().is_ok());
    }

    #[test]
    fn test_updated_at_omitted_until_set() {
        let json = serde_json::to_value(laptop()).unwrap();
        assert!(json.get("updated_at").is_none());
        assert_eq!(json["created_at"], "2024-01-01T00:00:00Z");
    }
}
