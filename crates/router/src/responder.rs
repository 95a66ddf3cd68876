//! Conversion of handler return values into [`OutgoingResponse`]s.
//!
//! The [`IntoResponse`] trait lets handler functions return plain values such as
//! `String`, `serde_json::Value` or `(StatusCode, T)`, which are turned into
//! response descriptors after the handler completes.

use crate::error::BoxError;
use crate::response::{OutgoingResponse, ResponseContent};
use http::{HeaderValue, StatusCode};
use serde_json::Value;

/// A trait for types that can be converted into an outgoing response.
pub trait IntoResponse {
    fn into_response(self) -> Result<OutgoingResponse, BoxError>;
}

/// Errors are passed through so the router can surface them as handler errors.
impl<T: IntoResponse, E: Into<BoxError>> IntoResponse for Result<T, E> {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => Err(e.into()),
        }
    }
}

/// `None` becomes an empty `404 Not Found`.
impl<T: IntoResponse> IntoResponse for Option<T> {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        match self {
            Some(t) => t.into_response(),
            None => Ok(OutgoingResponse::new(StatusCode::NOT_FOUND)),
        }
    }
}

impl IntoResponse for OutgoingResponse {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        Ok(self)
    }
}

/// Sets the status code along with the content.
impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        let (status, responder) = self;
        let mut response = responder.into_response()?;
        *response.status_mut() = status;
        Ok(response)
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        Ok(OutgoingResponse::new(StatusCode::NO_CONTENT))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        self.to_owned().into_response()
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        Ok(OutgoingResponse::new(StatusCode::OK)
            .with_header(http::header::CONTENT_TYPE, HeaderValue::from_str(mime::TEXT_PLAIN_UTF_8.as_ref())?)
            .with_content(ResponseContent::Text(self)))
    }
}

impl IntoResponse for Value {
    fn into_response(self) -> Result<OutgoingResponse, BoxError> {
        Ok(OutgoingResponse::new(StatusCode::OK)
            .with_header(http::header::CONTENT_TYPE, HeaderValue::from_str(mime::APPLICATION_JSON.as_ref())?)
            .with_content(ResponseContent::Json(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text() {
        let response = "hello".into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(http::header::CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");
        assert_eq!(response.content(), &ResponseContent::Text("hello".into()));
    }

    #[test]
    fn test_status_tuple_and_json() {
        let response = (StatusCode::CREATED, json!({"id": 1})).into_response().unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content(), &ResponseContent::Json(json!({"id": 1})));
    }

    #[test]
    fn test_result_and_option() {
        let failed: Result<String, &str> = Err("boom");
        assert_eq!(failed.into_response().unwrap_err().to_string(), "boom");

        let missing: Option<String> = None;
        assert_eq!(missing.into_response().unwrap().status(), StatusCode::NOT_FOUND);
        assert_eq!(().into_response().unwrap().status(), StatusCode::NO_CONTENT);
    }
}
