//! Validated query-string extractor, the `Query` counterpart of
//! [`ValidatedJson`](super::ValidatedJson).

use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::validated_json::validation_error_response;
use super::ApiResponse;

pub struct ValidatedQuery<T>(pub T);

pub enum ValidatedQueryRejection {
    QueryError(QueryRejection),
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedQueryRejection {
    fn into_response(self) -> Response {
        match self {
            Self::QueryError(rejection) => {
                let body = ApiResponse::<()>::error(format!(
                    "Invalid query string: {}",
                    rejection.body_text()
                ));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::ValidationError(errors) => validation_error_response(&errors),
        }
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidatedQueryRejection::QueryError)?;

        value
            .validate()
            .map_err(ValidatedQueryRejection::ValidationError)?;

        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Params {
        #[validate(range(min = 1, max = 100))]
        size: Option<u32>,
    }

    async fn handler(ValidatedQuery(p): ValidatedQuery<Params>) -> String {
        p.size.unwrap_or_default().to_string()
    }

    async fn status_of(uri: &str) -> StatusCode {
        Router::new()
            .route("/q", get(handler))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn accepts_valid_and_absent_values() {
        assert_eq!(status_of("/q").await, StatusCode::OK);
        assert_eq!(status_of("/q?size=50").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_out_of_range_and_malformed() {
        assert_eq!(status_of("/q?size=0").await, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of("/q?size=abc").await, StatusCode::BAD_REQUEST);
    }
}
