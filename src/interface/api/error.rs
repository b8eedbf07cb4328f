use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::Error;

/// API エラー
///
/// すべての非2xxレスポンスはここでProblemドキュメントに変換される。
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {detail}")]
    Validation {
        detail: String,
        errors: Vec<FieldError>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Service(#[from] Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Validation {
            detail: message.clone(),
            errors: vec![FieldError {
                field: field.into(),
                message,
            }],
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Service(e) => match e {
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Conflict(_) => StatusCode::CONFLICT,
                Error::Storage(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut problem = Problem::new(status);

        if status.is_server_error() {
            // 内部の詳細はクライアントに返さずログにのみ残す
            let correlation_id = Uuid::new_v4().to_string();
            error!(correlation_id = %correlation_id, error = %self, "request failed");
            problem.correlation_id = Some(correlation_id);
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
            problem.detail = Some(match &self {
                ApiError::Validation { detail, .. } => detail.clone(),
                ApiError::Service(Error::NotFound(msg)) | ApiError::Service(Error::Conflict(msg)) => {
                    msg.clone()
                }
                ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) | ApiError::NotFound(msg) => {
                    msg.clone()
                }
                other => other.to_string(),
            });
            if let ApiError::Validation { errors, .. } = self {
                problem.errors = errors;
            }
        }

        let mut response = (status, Json(problem)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// フィールド単位の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// エラーレスポンス（Problemドキュメント）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub status: u16,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: None,
            errors: Vec::new(),
            correlation_id: None,
        }
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        let errors: Vec<FieldError> = report
            .iter()
            .map(|(path, error)| {
                let field = path.to_string();
                FieldError {
                    field: if field.is_empty() { "body".to_string() } else { field },
                    message: error.message().to_string(),
                }
            })
            .collect();
        ApiError::Validation {
            detail: format!("{} invalid field(s)", errors.len()),
            errors,
        }
    }
}

// フレームワークの拒否はすべて400に正規化する
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation("tableId", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation("query", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn problem_of(err: ApiError) -> (StatusCode, Problem) {
        let response = err.into_response();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_has_detail() {
        let (status, problem) =
            problem_of(ApiError::Service(Error::NotFound("Table 9 not found".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail.as_deref(), Some("Table 9 not found"));
        assert!(problem.correlation_id.is_none());
    }

    #[tokio::test]
    async fn internal_failure_hides_detail() {
        let (status, problem) =
            problem_of(ApiError::Service(Error::Storage("disk on fire".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.detail.is_none());
        let id = problem.correlation_id.expect("correlation id");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let (status, _) = problem_of(ApiError::Service(Error::Conflict("dup".into()))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("missing bearer token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let (status, problem) = problem_of(ApiError::validation("name", "must not be blank")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            problem.errors,
            vec![FieldError {
                field: "name".into(),
                message: "must not be blank".into()
            }]
        );
    }
}
