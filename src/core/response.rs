//! 成功响应的统一信封

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use uuid::Uuid;

/// 所有成功响应都包在 `{"success": true, "data": ...}` 里
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// 每个响应单独生成，便于和日志对照
    pub request_id: String,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            request_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// 新建资源时使用，状态码为 201
    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self::success(data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::success(json!({"id": "1"}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], "1");
        assert!(Uuid::parse_str(value["request_id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_created_uses_201() {
        let (status, Json(first)) = ApiResponse::created("a");
        let (_, Json(second)) = ApiResponse::created("b");
        assert_eq!(status, StatusCode::CREATED);
        assert!(first.success);
        assert_ne!(first.request_id, second.request_id);
    }
}
