//! HTTP primitives: request/response representations and the
//! handler/middleware abstractions the pipeline is composed from.
//!
//! A [`Handler`] turns a request into a response. A [`Middleware`] wraps a
//! handler to add a cross-cutting concern. [`MiddlewareChain`] folds an
//! ordered middleware list around a final handler; the first middleware
//! added is the outermost layer.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Buffered HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	pub fn new(
		method: Method,
		uri: Uri,
		version: Version,
		headers: HeaderMap,
		body: Bytes,
	) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
		}
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// First value of a query parameter, percent-decoding left to callers
	/// (the parameters this API reads are plain integers).
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.uri.query()?.split('&').find_map(|pair| {
			let (key, value) = pair.split_once('=')?;
			(key == name).then_some(value)
		})
	}

	/// Header value as a string, `None` when absent or not valid UTF-8.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Whether the declared content type is JSON.
	pub fn has_json_content_type(&self) -> bool {
		self.header(CONTENT_TYPE.as_str())
			.is_some_and(|ct| ct.contains("application/json"))
	}

	/// Deserializes the body as JSON.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(&self.body)
			.map_err(|e| Error::InvalidArgument(format!("invalid JSON body: {e}")))
	}
}

/// Buffered HTTP response.
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	/// JSON response with the given status. Serialization of the response
	/// types in this crate cannot fail; if it somehow does, the client
	/// gets a bare 500 instead of a half-written body.
	pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
		match serde_json::to_vec(value) {
			Ok(body) => Self::new(status)
				.with_header(
					CONTENT_TYPE,
					HeaderValue::from_static("application/json; charset=utf-8"),
				)
				.with_body(body),
			Err(_) => Self::internal_server_error(),
		}
	}
}

/// Core request-processing abstraction.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Lets `Arc<dyn Handler>` itself be used as a handler.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// A transform from "next handler" to "handler".
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// Ordered middleware stack around a final handler.
///
/// Built once at startup; `handle` composes the layers right-to-left so
/// the first middleware added observes the request first and the response
/// last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut current: Arc<dyn Handler> = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			current = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current,
			});
		}
		current.handle(request).await
	}
}

struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}
