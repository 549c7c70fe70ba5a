//! Wire-format types.
//!
//! Pure projections of [`Task`] plus the request payloads. The update
//! payload is a patch: every field is an `Option` so "omitted" and "set to
//! empty" stay distinguishable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Task;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
	pub title: String,
	#[serde(default)]
	pub description: String,
}

impl CreateTaskRequest {
	pub fn into_entity(self) -> Task {
		Task::new(self.title, self.description)
	}
}

/// Partial-update payload for `PUT /tasks/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
	pub title: Option<String>,
	pub description: Option<String>,
	pub is_completed: Option<bool>,
}

impl UpdateTaskRequest {
	/// Copies present fields onto the fetched entity; absent fields are
	/// left untouched.
	pub fn apply_to(&self, task: &mut Task) {
		if let Some(title) = &self.title {
			task.title = title.clone();
		}
		if let Some(description) = &self.description {
			task.description = description.clone();
		}
		if let Some(is_completed) = self.is_completed {
			task.is_completed = is_completed;
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub is_completed: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskResponse {
	fn from(task: &Task) -> Self {
		Self {
			id: task.id,
			title: task.title.clone(),
			description: task.description.clone(),
			is_completed: task.is_completed,
			created_at: task.created_at,
			updated_at: task.updated_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
	pub tasks: Vec<TaskResponse>,
	pub meta: ListMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListMeta {
	pub total: usize,
	pub page: usize,
	pub limit: usize,
	pub total_pages: usize,
}

/// Stable error body: `{error, details?}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
	pub error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stored_task() -> Task {
		let mut task = Task::new("write report", "quarterly numbers");
		task.id = 7;
		task
	}

	#[test]
	fn patch_with_no_fields_changes_nothing() {
		let mut task = stored_task();
		let before = task.clone();
		UpdateTaskRequest::default().apply_to(&mut task);
		assert_eq!(task, before);
	}

	#[test]
	fn patch_distinguishes_absent_from_empty() {
		let mut task = stored_task();
		let patch: UpdateTaskRequest = serde_json::from_str(r#"{"description":""}"#).unwrap();
		patch.apply_to(&mut task);
		assert_eq!(task.description, "");
		assert_eq!(task.title, "write report");
	}

	#[test]
	fn patch_applies_all_present_fields() {
		let mut task = stored_task();
		let patch: UpdateTaskRequest =
			serde_json::from_str(r#"{"title":"new","description":"desc","is_completed":true}"#)
				.unwrap();
		patch.apply_to(&mut task);
		assert_eq!(task.title, "new");
		assert_eq!(task.description, "desc");
		assert!(task.is_completed);
	}

	#[test]
	fn error_body_omits_absent_details() {
		let body = ErrorBody {
			error: "task not found".into(),
			details: None,
		};
		assert_eq!(
			serde_json::to_string(&body).unwrap(),
			r#"{"error":"task not found"}"#
		);
	}

	#[test]
	fn task_response_is_a_lossless_projection() {
		let task = stored_task();
		let response = TaskResponse::from(&task);
		assert_eq!(response.id, 7);
		assert_eq!(response.title, task.title);
		assert_eq!(response.created_at, task.created_at);
	}

	#[test]
	fn create_request_defaults_description() {
		let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
		assert_eq!(req.description, "");
		let task = req.into_entity();
		assert!(!task.is_completed);
	}
}
