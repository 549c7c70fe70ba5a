//! Cross-origin resource sharing.
//!
//! Preflight `OPTIONS` requests are answered directly with 204 and never
//! reach the router; every other response gets the origin headers
//! appended on the way out.

use async_trait::async_trait;
use hyper::header::{
	HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
	ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
};
use hyper::{Method, StatusCode};
use std::sync::Arc;

use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};

#[derive(Clone, Debug)]
pub struct CorsConfig {
	pub allow_origins: Vec<String>,
	pub allow_methods: Vec<String>,
	pub allow_headers: Vec<String>,
	pub allow_credentials: bool,
	pub max_age_secs: u32,
}

impl Default for CorsConfig {
	fn default() -> Self {
		Self {
			allow_origins: vec!["*".into()],
			allow_methods: vec![
				"GET".into(),
				"POST".into(),
				"PUT".into(),
				"PATCH".into(),
				"DELETE".into(),
				"OPTIONS".into(),
			],
			allow_headers: vec!["Content-Type".into(), "X-Request-ID".into()],
			allow_credentials: false,
			max_age_secs: 3600,
		}
	}
}

pub struct CorsMiddleware {
	config: CorsConfig,
}

impl CorsMiddleware {
	pub fn new(config: CorsConfig) -> Self {
		Self { config }
	}

	/// Wildcard origin, common methods and headers, no credentials.
	pub fn permissive() -> Self {
		Self::new(CorsConfig::default())
	}

	fn apply_headers(&self, response: &mut Response) {
		response.headers.insert(
			ACCESS_CONTROL_ALLOW_ORIGIN,
			header_value(&self.config.allow_origins.join(", ")),
		);
		response.headers.insert(
			ACCESS_CONTROL_ALLOW_METHODS,
			header_value(&self.config.allow_methods.join(", ")),
		);
		response.headers.insert(
			ACCESS_CONTROL_ALLOW_HEADERS,
			header_value(&self.config.allow_headers.join(", ")),
		);
		if self.config.allow_credentials {
			response
				.headers
				.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
		}
	}
}

/// Configured values are plain ASCII; anything else falls back to "*"
/// rather than panicking inside the chain.
fn header_value(value: &str) -> HeaderValue {
	HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("*"))
}

#[async_trait]
impl Middleware for CorsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		if request.method == Method::OPTIONS {
			let mut response = Response::new(StatusCode::NO_CONTENT);
			self.apply_headers(&mut response);
			response.headers.insert(
				ACCESS_CONTROL_MAX_AGE,
				header_value(&self.config.max_age_secs.to_string()),
			);
			return Ok(response);
		}

		let mut response = next.handle(request).await?;
		self.apply_headers(&mut response);
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;
	use hyper::{HeaderMap, Uri, Version};

	struct CountingHandler {
		calls: std::sync::atomic::AtomicUsize,
	}

	#[async_trait]
	impl Handler for CountingHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
			Ok(Response::ok().with_body("hit"))
		}
	}

	fn request(method: Method) -> Request {
		Request::new(
			method,
			Uri::from_static("/tasks"),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	#[tokio::test]
	async fn preflight_short_circuits_with_204() {
		let handler = Arc::new(CountingHandler {
			calls: std::sync::atomic::AtomicUsize::new(0),
		});
		let middleware = CorsMiddleware::permissive();

		let response = middleware
			.process(request(Method::OPTIONS), handler.clone())
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NO_CONTENT);
		assert_eq!(response.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
		assert_eq!(response.headers.get(ACCESS_CONTROL_MAX_AGE).unwrap(), "3600");
		assert_eq!(handler.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn normal_requests_pass_through_with_headers_appended() {
		let handler = Arc::new(CountingHandler {
			calls: std::sync::atomic::AtomicUsize::new(0),
		});
		let middleware = CorsMiddleware::permissive();

		let response = middleware
			.process(request(Method::GET), handler.clone())
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body, Bytes::from("hit"));
		assert_eq!(response.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
		assert!(response
			.headers
			.get(ACCESS_CONTROL_ALLOW_METHODS)
			.unwrap()
			.to_str()
			.unwrap()
			.contains("PATCH"));
		assert_eq!(handler.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn credentials_flag_adds_the_header() {
		let config = CorsConfig {
			allow_origins: vec!["https://app.example.com".into()],
			allow_credentials: true,
			..CorsConfig::default()
		};
		let middleware = CorsMiddleware::new(config);
		let handler = Arc::new(CountingHandler {
			calls: std::sync::atomic::AtomicUsize::new(0),
		});

		let response = middleware
			.process(request(Method::GET), handler)
			.await
			.unwrap();

		assert_eq!(
			response.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
			"https://app.example.com"
		);
		assert_eq!(
			response
				.headers
				.get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
				.unwrap(),
			"true"
		);
	}
}
