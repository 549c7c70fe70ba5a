//! Hand-rolled path/method dispatch.
//!
//! No routing framework: the path is normalized, split into segments, and
//! dispatched on the leading segment plus the remaining segment count.
//! Nested sub-resource actions come from a fixed, closed vocabulary, so
//! every new route shape extends the explicit match below.

use async_trait::async_trait;
use hyper::Method;

use crate::error::{Error, Result};
use crate::handlers::{error_response, TaskHandlers};
use crate::http::{Handler, Request, Response};

pub struct ApiRouter {
	tasks: TaskHandlers,
}

impl ApiRouter {
	pub fn new(tasks: TaskHandlers) -> Self {
		Self { tasks }
	}

	async fn dispatch(&self, request: &Request) -> Result<Response> {
		// Normalize: strip one trailing slash, treat empty as root.
		let path = request.path().trim_end_matches('/');
		let segments: Vec<&str> = path
			.trim_start_matches('/')
			.split('/')
			.filter(|s| !s.is_empty())
			.collect();

		match segments.split_first() {
			Some((&"health", [])) => match request.method {
				Method::GET => self.tasks.health(),
				_ => Err(Error::MethodNotAllowed { allow: "GET" }),
			},
			Some((&"tasks", rest)) => self.dispatch_tasks(request, rest).await,
			_ => Err(Error::NotFound("resource")),
		}
	}

	async fn dispatch_tasks(&self, request: &Request, rest: &[&str]) -> Result<Response> {
		match rest {
			// Collection: /tasks
			[] => match request.method {
				Method::GET => self.tasks.list(request).await,
				Method::POST => self.tasks.create(request).await,
				_ => Err(Error::MethodNotAllowed { allow: "GET, POST" }),
			},
			// Item: /tasks/{id}
			[raw_id] => {
				let id = parse_id(raw_id)?;
				match request.method {
					Method::GET => self.tasks.get(id).await,
					Method::PUT => self.tasks.update(request, id).await,
					Method::DELETE => self.tasks.delete(id).await,
					_ => Err(Error::MethodNotAllowed {
						allow: "GET, PUT, DELETE",
					}),
				}
			}
			// Item action: /tasks/{id}/{action}
			[raw_id, action] => {
				let id = parse_id(raw_id)?;
				match *action {
					"complete" => match request.method {
						Method::PATCH => self.tasks.complete(id).await,
						_ => Err(Error::MethodNotAllowed { allow: "PATCH" }),
					},
					"incomplete" => match request.method {
						Method::PATCH => self.tasks.incomplete(id).await,
						_ => Err(Error::MethodNotAllowed { allow: "PATCH" }),
					},
					_ => Err(Error::NotFound("resource")),
				}
			}
			_ => Err(Error::NotFound("resource")),
		}
	}
}

fn parse_id(raw: &str) -> Result<i64> {
	raw.parse::<i64>()
		.ok()
		.filter(|&id| id > 0)
		.ok_or_else(|| Error::InvalidArgument("task id must be a positive number".into()))
}

#[async_trait]
impl Handler for ApiRouter {
	async fn handle(&self, request: Request) -> Result<Response> {
		// Taxonomy errors become responses here; an Err never leaves the
		// router, so anything above it is by definition unexpected.
		match self.dispatch(&request).await {
			Ok(response) => Ok(response),
			Err(err) => Ok(error_response(&err)),
		}
	}
}
