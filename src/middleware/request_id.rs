//! Request correlation.
//!
//! Reuses an inbound `X-Request-ID` when present, generates a UUID
//! otherwise, threads the value through the request headers for the
//! layers beneath, and always echoes it on the response.

use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub struct RequestIdMiddleware;

impl RequestIdMiddleware {
	pub fn new() -> Self {
		Self
	}
}

impl Default for RequestIdMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for RequestIdMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let request_id = request
			.header(REQUEST_ID_HEADER.as_str())
			.map(str::to_string)
			.unwrap_or_else(|| Uuid::new_v4().to_string());

		// A reused inbound value is already a valid header; a generated
		// UUID always is.
		if let Ok(value) = HeaderValue::from_str(&request_id) {
			request.headers.insert(REQUEST_ID_HEADER, value.clone());
			let mut response = next.handle(request).await?;
			response.headers.insert(REQUEST_ID_HEADER, value);
			Ok(response)
		} else {
			next.handle(request).await
		}
	}
}
