//! Domain service: the sole caller of the repository from above.
//!
//! Mirrors the repository operations one-to-one but adds policy:
//! validation before the store is touched, id guards, existence checks
//! ahead of writes, and idempotent completion transitions.

use std::sync::Arc;

use crate::entity::Task;
use crate::error::{Error, Result};
use crate::repository::TaskRepository;

pub struct TaskService {
	repo: Arc<dyn TaskRepository>,
}

impl TaskService {
	pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
		Self { repo }
	}

	/// Validates the normalized entity before the store is touched. The
	/// store forces `is_completed = false` regardless of caller input.
	pub async fn create(&self, mut task: Task) -> Result<Task> {
		task.normalize();
		task.validate()?;
		task.is_completed = false;
		self.repo.create(task).await
	}

	pub async fn get_by_id(&self, id: i64) -> Result<Task> {
		Self::check_id(id)?;
		self.repo.get_by_id(id).await
	}

	pub async fn get_all(&self) -> Result<Vec<Task>> {
		self.repo.get_all().await
	}

	/// Re-validates and confirms existence before the write. The
	/// repository still guards the affected-row count redundantly.
	pub async fn update(&self, mut task: Task) -> Result<Task> {
		Self::check_id(task.id)?;
		task.normalize();
		task.validate()?;
		self.repo.get_by_id(task.id).await?;
		self.repo.update(task).await
	}

	pub async fn delete(&self, id: i64) -> Result<()> {
		Self::check_id(id)?;
		self.repo.get_by_id(id).await?;
		self.repo.delete(id).await
	}

	/// Marks the task complete. Already-complete tasks are returned
	/// unchanged: no write, no `updated_at` bump.
	pub async fn complete(&self, id: i64) -> Result<Task> {
		self.transition(id, true).await
	}

	/// Marks the task incomplete; idempotent like [`complete`].
	///
	/// [`complete`]: Self::complete
	pub async fn incomplete(&self, id: i64) -> Result<Task> {
		self.transition(id, false).await
	}

	async fn transition(&self, id: i64, target: bool) -> Result<Task> {
		Self::check_id(id)?;
		let mut task = self.repo.get_by_id(id).await?;
		if task.is_completed == target {
			return Ok(task);
		}
		if target {
			task.mark_completed();
		} else {
			task.mark_incomplete();
		}
		self.repo.update(task).await
	}

	fn check_id(id: i64) -> Result<()> {
		if id <= 0 {
			return Err(Error::InvalidArgument(
				"task id must be greater than 0".into(),
			));
		}
		Ok(())
	}
}
