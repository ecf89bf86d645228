//! 请求体校验
//!
//! 先按 JSON 类型逐字段转换，再用 `validator` 检查数值范围。

use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::model::{NewProduct, ProductChanges, ProductFilter, PRICE_MESSAGE, STOCK_MESSAGE};
use crate::core::error::CoreError;

const REQUIRED_FIELDS: [&str; 5] = ["name", "description", "price", "category", "stock"];

fn as_object(body: &Value) -> Result<&Map<String, Value>, CoreError> {
    body.as_object()
        .ok_or_else(|| CoreError::BadRequest("Request body must be a JSON object".to_string()))
}

fn string_field(field: &str, value: &Value) -> Result<String, CoreError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CoreError::validation(field, format!("{} must be a string", field)))
}

fn price_field(value: &Value) -> Result<f64, CoreError> {
    value
        .as_f64()
        .ok_or_else(|| CoreError::validation("price", PRICE_MESSAGE))
}

/// 只接受 JSON 整数，`5.0` 之类的浮点数会被拒绝
fn integer_field(field: &str, value: &Value, message: &str) -> Result<i64, CoreError> {
    value
        .as_i64()
        .ok_or_else(|| CoreError::validation(field, message))
}

fn optional<T>(
    object: &Map<String, Value>,
    field: &str,
    parse: impl Fn(&Value) -> Result<T, CoreError>,
) -> Result<Option<T>, CoreError> {
    object.get(field).map(parse).transpose()
}

/// 把 validator 的错误转换为第一个出错字段（按字段名排序）
fn into_core_error(errors: ValidationErrors) -> CoreError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let field = field.to_string();
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{} is invalid", field));
            (field, message)
        })
        .collect();
    fields.sort();

    match fields.into_iter().next() {
        Some((field, message)) => CoreError::Validation { field, message },
        None => CoreError::BadRequest("Invalid request body".to_string()),
    }
}

/// 解析并校验创建请求
pub fn parse_new_product(body: &Value) -> Result<NewProduct, CoreError> {
    let object = as_object(body)?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(CoreError::validation(
            *missing,
            format!("Missing required field: {}", missing),
        ));
    }

    let new = NewProduct {
        name: string_field("name", &object["name"])?,
        description: string_field("description", &object["description"])?,
        price: price_field(&object["price"])?,
        category: string_field("category", &object["category"])?,
        stock: integer_field("stock", &object["stock"], STOCK_MESSAGE)?,
    };
    new.validate().map_err(into_core_error)?;
    Ok(new)
}

/// 解析并校验部分更新，`id` 和 `created_at` 等字段被忽略
pub fn parse_product_changes(body: &Value) -> Result<ProductChanges, CoreError> {
    let object = as_object(body)?;

    let changes = ProductChanges {
        name: optional(object, "name", |v| string_field("name", v))?,
        description: optional(object, "description", |v| string_field("description", v))?,
        price: optional(object, "price", price_field)?,
        category: optional(object, "category", |v| string_field("category", v))?,
        stock: optional(object, "stock", |v| integer_field("stock", v, STOCK_MESSAGE))?,
    };
    changes.validate().map_err(into_core_error)?;
    Ok(changes)
}

/// 解析库存调整请求 `{ "quantity": <integer> }`
pub fn parse_stock_quantity(body: &Value) -> Result<i64, CoreError> {
    let object = as_object(body)?;
    let quantity = object.get("quantity").ok_or_else(|| {
        CoreError::validation("quantity", "Missing required field: quantity")
    })?;
    integer_field("quantity", quantity, "quantity must be an integer")
}

/// `GET /products` 的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// 无法解析的价格参数视为未提供
fn price_param(field: &str, raw: Option<String>) -> Option<f64> {
    let text = raw?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let value = text.parse::<f64>().ok().filter(|v| v.is_finite());
    if value.is_none() {
        tracing::debug!("忽略无法解析的 {}: {}", field, text);
    }
    value
}

impl From<ListQuery> for ProductFilter {
    fn from(query: ListQuery) -> Self {
        ProductFilter {
            category: query.category.filter(|c| !c.is_empty()),
            min_price: price_param("min_price", query.min_price),
            max_price: price_param("max_price", query.max_price),
        }
    }
}
