//! Structured access logging.
//!
//! Emits exactly one line per request after the inner layers finish:
//! method, path, status, response bytes, elapsed time, and the
//! correlation id assigned upstream. A panicking handler still gets its
//! access line; the panic is then re-raised for the recovery layer to
//! turn into a response.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use super::request_id::REQUEST_ID_HEADER;
use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};

pub struct AccessLogMiddleware;

impl AccessLogMiddleware {
	pub fn new() -> Self {
		Self
	}
}

impl Default for AccessLogMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for AccessLogMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.clone();
		let path = request.path().to_string();
		let request_id = request
			.header(REQUEST_ID_HEADER.as_str())
			.unwrap_or("-")
			.to_string();

		let outcome = AssertUnwindSafe(next.handle(request)).catch_unwind().await;
		let elapsed_ms = start.elapsed().as_millis() as u64;

		match outcome {
			Ok(Ok(response)) => {
				tracing::info!(
					target: "task_api::access",
					%method,
					%path,
					status = response.status.as_u16(),
					bytes = response.body.len(),
					elapsed_ms,
					request_id,
					"request"
				);
				Ok(response)
			}
			Ok(Err(err)) => {
				tracing::info!(
					target: "task_api::access",
					%method,
					%path,
					status = 500u16,
					bytes = 0usize,
					elapsed_ms,
					request_id,
					error = %err,
					"request"
				);
				Err(err)
			}
			Err(panic) => {
				tracing::info!(
					target: "task_api::access",
					%method,
					%path,
					status = 500u16,
					bytes = 0usize,
					elapsed_ms,
					request_id,
					"request"
				);
				// Recovery sits outside this layer and owns the response.
				std::panic::resume_unwind(panic)
			}
		}
	}
}
