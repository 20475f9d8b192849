//! 통합 API 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 성공/에러 형식을 제공합니다.
//!
//! ```json
//! { "success": false, "error": { "code": "ERROR", "message": "authentication required" } }
//! ```

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use asset_core::AssetError;

/// 기본 에러 코드.
pub const ERROR_CODE: &str = "ERROR";

/// 에러 상세.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// 에러 코드
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (필드별 검증 실패 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// 통합 API 에러 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 항상 false
    pub success: bool,
    pub error: ErrorBody,
}

impl ApiErrorResponse {
    /// 기본 코드로 에러 생성.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(ERROR_CODE, message)
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// 상세 정보 포함 에러 생성.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error.code, self.error.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 성공 응답 래퍼.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 항상 true
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 데이터 없는 성공 응답.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

// ==================== Result Type Alias ====================

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 에러 응답 생성 헬퍼.
pub fn api_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(message)))
}

/// 저장소 에러를 HTTP 응답으로 변환합니다.
///
/// 내부 에러는 로그에만 남기고 일반 메시지로 응답합니다.
pub fn store_error(err: AssetError) -> (StatusCode, Json<ApiErrorResponse>) {
    match err {
        AssetError::InvalidInput(msg) => api_error(StatusCode::BAD_REQUEST, msg),
        AssetError::NotFound(_) => api_error(StatusCode::NOT_FOUND, "resource not found"),
        AssetError::Conflict(_) => api_error(StatusCode::CONFLICT, "username or email already in use"),
        other => {
            error!(error = %other, "Unhandled store error");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let error = ApiErrorResponse::new("authentication required");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": { "code": "ERROR", "message": "authentication required" }
            })
        );
    }

    #[test]
    fn test_error_with_details() {
        let error = ApiErrorResponse::new("validation failed")
            .with_details(serde_json::json!({"field": "email"}));
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains(r#""details":{"field":"email"}"#));
        assert_eq!(error.to_string(), "[ERROR] validation failed");
    }

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::ok(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);

        let json = serde_json::to_value(ApiResponse::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[test]
    fn test_asset_error_mapping() {
        let (status, body) = store_error(AssetError::Conflict("dup".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message(), "username or email already in use");

        let (status, body) = store_error(AssetError::Database("connection refused at 10.0.0.1".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message().contains("10.0.0.1"));
    }
}
