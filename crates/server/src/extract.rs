//! Extractors whose rejections render as `{ "error": ... }` like every
//! other API error.

use axum::extract::{FromRequest, FromRequestParts};

use crate::ServerError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct QueryParams<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct PathParam<T>(pub T);
