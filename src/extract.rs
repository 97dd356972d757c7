use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

// Thin wrappers over axum's extractors whose rejections become `ApiError::Validation`,
// so bad input gets the same `{"detail": ...}` envelope as every other failure.

/// JSON body extractor.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `application/x-www-form-urlencoded` body extractor.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);
