//! HTTP handlers: translate wire requests into service calls and service
//! results into wire responses. No business-error interpretation happens
//! here beyond mapping the error taxonomy onto status codes.

use hyper::header::{HeaderValue, ALLOW};
use hyper::StatusCode;
use serde_json::json;
use std::sync::Arc;

use crate::dto::{CreateTaskRequest, ErrorBody, ListMeta, TaskListResponse, TaskResponse, UpdateTaskRequest};
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::service::TaskService;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// Builds the JSON error response for a taxonomy error, including the
/// `Allow` header for 405s.
pub fn error_response(err: &Error) -> Response {
	let body = ErrorBody {
		error: err.public_message(),
		details: err.public_details(),
	};
	let mut response = Response::json(err.status(), &body);
	if let Error::MethodNotAllowed { allow } = err {
		response
			.headers
			.insert(ALLOW, HeaderValue::from_static(allow));
	}
	response
}

pub struct TaskHandlers {
	service: Arc<TaskService>,
}

impl TaskHandlers {
	pub fn new(service: Arc<TaskService>) -> Self {
		Self { service }
	}

	/// GET /health — liveness only, no dependency checks.
	pub fn health(&self) -> Result<Response> {
		Ok(Response::json(StatusCode::OK, &json!({ "status": "ok" })))
	}

	/// GET /tasks — paginated list over the full result set.
	pub async fn list(&self, request: &Request) -> Result<Response> {
		let page = parse_query_number(request, "page", DEFAULT_PAGE, usize::MAX);
		let limit = parse_query_number(request, "limit", DEFAULT_LIMIT, MAX_LIMIT);

		let tasks = self.service.get_all().await?;
		let total = tasks.len();
		// Saturating offset: an absurdly large page yields an empty slice
		// instead of overflowing.
		let offset = page.saturating_sub(1).saturating_mul(limit);
		let page_items: Vec<TaskResponse> = tasks
			.iter()
			.skip(offset)
			.take(limit)
			.map(TaskResponse::from)
			.collect();

		let body = TaskListResponse {
			tasks: page_items,
			meta: ListMeta {
				total,
				page,
				limit,
				total_pages: total.div_ceil(limit),
			},
		};
		Ok(Response::json(StatusCode::OK, &body))
	}

	/// POST /tasks
	pub async fn create(&self, request: &Request) -> Result<Response> {
		require_json(request)?;
		let payload: CreateTaskRequest = request.json()?;
		let created = self.service.create(payload.into_entity()).await?;
		Ok(Response::json(
			StatusCode::CREATED,
			&TaskResponse::from(&created),
		))
	}

	/// GET /tasks/{id}
	pub async fn get(&self, id: i64) -> Result<Response> {
		let task = self.service.get_by_id(id).await?;
		Ok(Response::json(StatusCode::OK, &TaskResponse::from(&task)))
	}

	/// PUT /tasks/{id} — partial update: omitted fields stay unchanged.
	pub async fn update(&self, request: &Request, id: i64) -> Result<Response> {
		require_json(request)?;
		let patch: UpdateTaskRequest = request.json()?;
		let mut task = self.service.get_by_id(id).await?;
		patch.apply_to(&mut task);
		let updated = self.service.update(task).await?;
		Ok(Response::json(StatusCode::OK, &TaskResponse::from(&updated)))
	}

	/// DELETE /tasks/{id}
	pub async fn delete(&self, id: i64) -> Result<Response> {
		self.service.delete(id).await?;
		Ok(Response::no_content())
	}

	/// PATCH /tasks/{id}/complete — idempotent.
	pub async fn complete(&self, id: i64) -> Result<Response> {
		let task = self.service.complete(id).await?;
		Ok(Response::json(StatusCode::OK, &TaskResponse::from(&task)))
	}

	/// PATCH /tasks/{id}/incomplete — idempotent.
	pub async fn incomplete(&self, id: i64) -> Result<Response> {
		let task = self.service.incomplete(id).await?;
		Ok(Response::json(StatusCode::OK, &TaskResponse::from(&task)))
	}
}

fn require_json(request: &Request) -> Result<()> {
	if !request.has_json_content_type() {
		return Err(Error::InvalidArgument(
			"Content-Type must be application/json".into(),
		));
	}
	Ok(())
}

/// Query-parameter parse with fallback: absent, non-numeric, zero, or
/// over-the-cap values all fall back to the default rather than erroring.
fn parse_query_number(request: &Request, name: &str, default: usize, max: usize) -> usize {
	request
		.query_param(name)
		.and_then(|raw| raw.parse::<usize>().ok())
		.filter(|&n| n > 0 && n <= max)
		.unwrap_or(default)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;
	use hyper::{HeaderMap, Method, Uri, Version};

	fn get(uri: &'static str) -> Request {
		Request::new(
			Method::GET,
			Uri::from_static(uri),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	#[test]
	fn pagination_params_fall_back_to_defaults() {
		assert_eq!(parse_query_number(&get("/tasks"), "page", 1, usize::MAX), 1);
		assert_eq!(
			parse_query_number(&get("/tasks?page=abc"), "page", 1, usize::MAX),
			1
		);
		assert_eq!(
			parse_query_number(&get("/tasks?page=0"), "page", 1, usize::MAX),
			1
		);
		assert_eq!(
			parse_query_number(&get("/tasks?page=3"), "page", 1, usize::MAX),
			3
		);
	}

	#[test]
	fn limit_is_capped_at_one_hundred() {
		assert_eq!(
			parse_query_number(&get("/tasks?limit=100"), "limit", 10, 100),
			100
		);
		assert_eq!(
			parse_query_number(&get("/tasks?limit=101"), "limit", 10, 100),
			10
		);
	}

	#[test]
	fn method_not_allowed_response_carries_allow_header() {
		let response = error_response(&Error::MethodNotAllowed { allow: "GET, POST" });
		assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.headers.get(ALLOW).unwrap(), "GET, POST");
	}

	#[test]
	fn store_error_response_is_generic() {
		let response = error_response(&Error::store("select task", sqlx::Error::PoolClosed));
		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
		let body: ErrorBody = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body.error, "internal server error");
		assert!(body.details.is_none());
	}
}
