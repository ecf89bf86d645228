//! 产品处理器

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::{
    model::{DeletedProduct, Product, ProductFilter, ProductList, StockChange},
    validation::{parse_new_product, parse_product_changes, parse_stock_quantity, ListQuery},
};
use crate::app::state::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

type ApiResult<T> = Result<Json<ApiResponse<T>>, CoreError>;

fn query_error(rejection: QueryRejection) -> CoreError {
    CoreError::BadRequest(rejection.body_text())
}

/// 获取产品列表 (支持 category / min_price / max_price 过滤)
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ProductList> {
    let Query(query) = query.map_err(query_error)?;
    let filter = ProductFilter::from(query);

    let products = state.product_service.list_products(&filter)?;
    let total = products.len();
    Ok(Json(ApiResponse::success(ProductList { products, total })))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let product = state.product_service.get_product(&id)?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), CoreError> {
    let Json(body) = payload?;
    let new = parse_new_product(&body)?;

    let product = state.product_service.create_product(new)?;
    Ok(ApiResponse::created(product))
}

/// 更新产品，先完成全部校验再修改
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Product> {
    // 不存在的产品优先返回 404
    state.product_service.ensure_exists(&id)?;

    let Json(body) = payload?;
    let changes = parse_product_changes(&body)?;

    let product = state.product_service.update_product(&id, changes)?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedProduct> {
    let product = state.product_service.delete_product(&id)?;
    Ok(Json(ApiResponse::success(DeletedProduct {
        id: product.id,
        message: "Product deleted successfully".to_string(),
    })))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<StockChange> {
    state.product_service.ensure_exists(&id)?;

    let Json(body) = payload?;
    let quantity = parse_stock_quantity(&body)?;

    let change = state.product_service.adjust_stock(&id, quantity)?;
    Ok(Json(ApiResponse::success(change)))
}
