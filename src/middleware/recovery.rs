//! Panic and stray-error containment.
//!
//! Outermost layer of the chain: a fault anywhere beneath it becomes a
//! generic 500 instead of tearing down the connection task.

use async_trait::async_trait;
use futures::FutureExt;
use hyper::header::HeaderValue;
use hyper::StatusCode;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

use super::request_id::REQUEST_ID_HEADER;
use crate::dto::ErrorBody;
use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};

pub struct RecoveryMiddleware;

impl RecoveryMiddleware {
	pub fn new() -> Self {
		Self
	}

	/// Fallback 500. A fault unwinds past the request-id layer, so the
	/// correlation header is stamped here: the inbound id when the client
	/// sent one, a fresh one otherwise.
	fn internal_error(request_id: Option<String>) -> Response {
		let id = request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
		let mut response = Response::json(
			StatusCode::INTERNAL_SERVER_ERROR,
			&ErrorBody {
				error: "internal server error".into(),
				details: None,
			},
		);
		if let Ok(value) = HeaderValue::from_str(&id) {
			response.headers.insert(REQUEST_ID_HEADER, value);
		}
		response
	}
}

impl Default for RecoveryMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for RecoveryMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let method = request.method.clone();
		let path = request.path().to_string();
		let request_id = request
			.header(REQUEST_ID_HEADER.as_str())
			.map(str::to_string);

		match AssertUnwindSafe(next.handle(request)).catch_unwind().await {
			Ok(Ok(response)) => Ok(response),
			Ok(Err(err)) => {
				// The router converts taxonomy errors itself, so anything
				// arriving here is unanticipated.
				tracing::error!(%method, %path, error = %err, "unhandled error reached recovery");
				Ok(Self::internal_error(request_id))
			}
			Err(panic) => {
				tracing::error!(
					%method,
					%path,
					panic = panic_message(&panic),
					"handler panicked"
				);
				Ok(Self::internal_error(request_id))
			}
		}
	}
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
	if let Some(s) = panic.downcast_ref::<&str>() {
		s
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s
	} else {
		"<non-string panic payload>"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;
	use bytes::Bytes;
	use hyper::{HeaderMap, Method, Uri, Version};

	struct PanickingHandler;

	#[async_trait]
	impl Handler for PanickingHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			panic!("boom");
		}
	}

	struct FailingHandler;

	#[async_trait]
	impl Handler for FailingHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::Unexpected("wiring bug".into()))
		}
	}

	struct OkHandler;

	#[async_trait]
	impl Handler for OkHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body("fine"))
		}
	}

	fn get() -> Request {
		Request::new(
			Method::GET,
			Uri::from_static("/tasks"),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	#[tokio::test]
	async fn panics_become_generic_500s() {
		let middleware = RecoveryMiddleware::new();
		let response = middleware
			.process(get(), Arc::new(PanickingHandler))
			.await
			.unwrap();
		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
		let body: ErrorBody = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body.error, "internal server error");
		assert!(body.details.is_none());
		assert!(response.headers.contains_key(&REQUEST_ID_HEADER));
	}

	#[tokio::test]
	async fn fallback_reuses_the_inbound_request_id() {
		let middleware = RecoveryMiddleware::new();
		let mut request = get();
		request
			.headers
			.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));

		let response = middleware
			.process(request, Arc::new(PanickingHandler))
			.await
			.unwrap();
		assert_eq!(response.headers.get(&REQUEST_ID_HEADER).unwrap(), "abc-123");
	}

	#[tokio::test]
	async fn stray_errors_become_generic_500s() {
		let middleware = RecoveryMiddleware::new();
		let response = middleware
			.process(get(), Arc::new(FailingHandler))
			.await
			.unwrap();
		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[tokio::test]
	async fn successful_responses_pass_through_untouched() {
		let middleware = RecoveryMiddleware::new();
		let response = middleware.process(get(), Arc::new(OkHandler)).await.unwrap();
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body, Bytes::from("fine"));
	}
}
