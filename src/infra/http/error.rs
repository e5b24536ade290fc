use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use movies_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::{
    auth::AuthError, catalog::CatalogError, error::ErrorReport, flush::FlushError,
};

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const UNPROCESSABLE: &str = "unprocessable";
    pub const SEARCH_UNAVAILABLE: &str = "search_unavailable";
    pub const CACHE_UNAVAILABLE: &str = "cache_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn unprocessable(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::UNPROCESSABLE,
            "Invalid request parameters",
            Some(hint.into()),
        )
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Keep the full error chain for response logging without exposing it to clients.
    fn caused_by(mut self, source: &'static str, error: &dyn StdError) -> Self {
        self.report = Some(ErrorReport::from_error(source, self.status, error));
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http::api",
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        const SOURCE: &str = "infra::http::catalog_error_to_api";
        let api = match &error {
            CatalogError::Search(_) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                codes::SEARCH_UNAVAILABLE,
                "Search backend unavailable",
                None,
            ),
            CatalogError::Cache(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE_UNAVAILABLE,
                "Cache store unavailable",
                None,
            ),
            CatalogError::Domain(_) | CatalogError::Encode(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Internal server error",
                None,
            ),
        };
        api.caused_by(SOURCE, &error)
    }
}

impl From<FlushError> for ApiError {
    fn from(error: FlushError) -> Self {
        const SOURCE: &str = "infra::http::flush_error_to_api";
        let api = match &error {
            FlushError::Unauthorized(AuthError::Missing) => {
                ApiError::unauthorized("Bearer token required")
            }
            FlushError::Unauthorized(AuthError::Expired) => {
                ApiError::unauthorized("Signature has expired")
            }
            FlushError::Unauthorized(_) => ApiError::unauthorized("Token is invalid"),
            FlushError::Cache(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE_UNAVAILABLE,
                "Cache store unavailable",
                None,
            ),
        };
        api.caused_by(SOURCE, &error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{application::search::SearchError, cache::CacheError};

    #[test]
    fn search_failures_map_to_bad_gateway() {
        let api = ApiError::from(CatalogError::from(SearchError::Rejected {
            status: 400,
            body: "parse_exception".to_string(),
        }));
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api.code(), codes::SEARCH_UNAVAILABLE);
    }

    #[test]
    fn cache_failures_map_to_service_unavailable() {
        let api = ApiError::from(CatalogError::from(CacheError::unavailable("refused")));
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.code(), codes::CACHE_UNAVAILABLE);
    }

    #[test]
    fn auth_failures_map_to_unauthorized() {
        let expired = ApiError::from(FlushError::from(AuthError::Expired));
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.message, "Signature has expired");

        let missing = ApiError::from(FlushError::from(AuthError::Missing));
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn response_carries_report_extension() {
        let response =
            ApiError::from(CatalogError::from(SearchError::transport("refused"))).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.source, "infra::http::catalog_error_to_api");
        assert!(report.messages[0].contains("refused"));
    }
}
