//! Tokio/hyper HTTP server.
//!
//! One spawned task per accepted connection; each request body is
//! buffered fully before the handler runs, and the handler's buffered
//! response is written back as a single `Full` body.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::http::{Handler, Middleware, MiddlewareChain, Request, Response};

pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
		}
	}

	/// Adds a middleware layer. The first one added is outermost.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	fn build_handler(&self) -> Arc<dyn Handler> {
		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}
		Arc::new(chain)
	}

	/// Binds and serves until the task is cancelled or accept fails.
	pub async fn listen(self, addr: SocketAddr) -> std::io::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(%addr, "listening");

		let handler = self.build_handler();

		loop {
			let (stream, remote_addr) = listener.accept().await?;
			let handler = handler.clone();

			tokio::spawn(async move {
				if let Err(err) = Self::handle_connection(stream, remote_addr, handler).await {
					tracing::debug!(%remote_addr, error = %err, "connection ended with error");
				}
			});
		}
	}

	async fn handle_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		handler: Arc<dyn Handler>,
	) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr,
		};

		http1::Builder::new().serve_connection(io, service).await?;

		Ok(())
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body_bytes = body.collect().await?.to_bytes();

			let mut request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body_bytes,
			);
			request.remote_addr = Some(remote_addr);

			// The recovery layer turns faults into 500s already; this is
			// the last resort for a chain without it.
			let response = handler
				.handle(request)
				.await
				.unwrap_or_else(|_| Response::internal_server_error());

			let mut hyper_response = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				hyper_response = hyper_response.header(key, value);
			}

			Ok(hyper_response.body(Full::new(response.body))?)
		})
	}
}
