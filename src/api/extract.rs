use axum::extract::FromRequest;

use crate::api::error::ApiError;

/// `Json` whose rejections render as problem bodies.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
