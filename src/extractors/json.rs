//! JSON request bodies whose rejections use the crate's error envelope.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Any JSON value. Malformed JSON or a missing `application/json` content type
/// becomes a 422 at `["body", "__root__"]`; oversized bodies keep their 413.
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(v)) => Ok(JsonBody(v)),
            Err(rejection) => Err(reject(rejection)),
        }
    }
}

fn reject(rejection: JsonRejection) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return rejection.into_response();
    }
    let kind = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "value_error.content_type",
        _ => "value_error.jsondecode",
    };
    AppError::invalid("body", "__root__", rejection.body_text(), kind).into_response()
}
