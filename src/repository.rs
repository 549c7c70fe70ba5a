//! Persistence layer.
//!
//! [`TaskRepository`] is the abstract contract the service depends on.
//! [`SqlTaskRepository`] is the production implementation over a shared
//! `sqlx::AnyPool`; [`InMemoryTaskRepository`] backs the test suite.
//!
//! All SQL uses positional placeholders bound at execution time. Writes
//! decide success by affected-row count: an `UPDATE`/`DELETE` that matches
//! no row executes without a driver error but changes nothing, and must
//! surface as `NotFound`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use std::sync::Arc;
use std::sync::Mutex;

use crate::entity::Task;
use crate::error::{Error, Result};

/// Abstract persistence contract for tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
	/// Persists a new row and returns the task with `id` and timestamps
	/// populated by the store.
	async fn create(&self, task: Task) -> Result<Task>;

	async fn get_by_id(&self, id: i64) -> Result<Task>;

	/// All tasks, newest creation first. Empty store yields an empty vec.
	async fn get_all(&self) -> Result<Vec<Task>>;

	/// Writes title/description/completion; the store sets `updated_at`.
	async fn update(&self, task: Task) -> Result<Task>;

	async fn delete(&self, id: i64) -> Result<()>;
}

/// SQL-backed repository.
///
/// The pool is owned by the bootstrap and handed in by reference; the
/// repository never closes it. Timestamps are stored as RFC3339 text so
/// the same statements work across the `any` driver's backends.
pub struct SqlTaskRepository {
	pool: Arc<AnyPool>,
}

impl SqlTaskRepository {
	pub fn new(pool: Arc<AnyPool>) -> Self {
		Self { pool }
	}

	/// Creates the tasks table if it does not exist.
	///
	/// `AUTOINCREMENT` keeps id assignment monotonic so deleted ids are
	/// never reused. Non-sqlite deployments provision the equivalent
	/// schema through their own migrations.
	pub async fn create_table(&self) -> Result<()> {
		let ddl = r#"
			CREATE TABLE IF NOT EXISTS tasks (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				title TEXT NOT NULL,
				description TEXT NOT NULL DEFAULT '',
				is_completed BOOLEAN NOT NULL DEFAULT FALSE,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
		"#;
		sqlx::query(ddl)
			.execute(&*self.pool)
			.await
			.map_err(|e| Error::store("create tasks table", e))?;
		Ok(())
	}
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|ts| ts.with_timezone(&Utc))
		.map_err(|e| Error::store("decode timestamp", sqlx::Error::Decode(Box::new(e))))
}

fn task_from_row(row: &AnyRow) -> Result<Task> {
	let created_at: String = row
		.try_get("created_at")
		.map_err(|e| Error::store("scan task", e))?;
	let updated_at: String = row
		.try_get("updated_at")
		.map_err(|e| Error::store("scan task", e))?;
	Ok(Task {
		id: row.try_get("id").map_err(|e| Error::store("scan task", e))?,
		title: row
			.try_get("title")
			.map_err(|e| Error::store("scan task", e))?,
		description: row
			.try_get("description")
			.map_err(|e| Error::store("scan task", e))?,
		is_completed: row
			.try_get("is_completed")
			.map_err(|e| Error::store("scan task", e))?,
		created_at: decode_timestamp(&created_at)?,
		updated_at: decode_timestamp(&updated_at)?,
	})
}

#[async_trait]
impl TaskRepository for SqlTaskRepository {
	async fn create(&self, task: Task) -> Result<Task> {
		let now = encode_timestamp(Utc::now());
		// RETURNING recovers the new id through the `any` driver, where
		// last_insert_id is not reliably populated. Supported by the
		// sqlite and postgres backends; mysql needs its own statement.
		let row = sqlx::query(
			"INSERT INTO tasks (title, description, is_completed, created_at, updated_at) \
			 VALUES (?, ?, ?, ?, ?) RETURNING id",
		)
		.bind(&task.title)
		.bind(&task.description)
		.bind(false)
		.bind(&now)
		.bind(&now)
		.fetch_one(&*self.pool)
		.await
		.map_err(|e| Error::store("insert task", e))?;

		let id: i64 = row.try_get("id").map_err(|e| Error::store("insert task", e))?;

		// Re-fetch so the returned timestamps are the store's truth.
		self.get_by_id(id).await
	}

	async fn get_by_id(&self, id: i64) -> Result<Task> {
		// The service guards this upstream; re-checked here so the
		// repository is safe to call directly.
		if id <= 0 {
			return Err(Error::InvalidArgument(
				"task id must be greater than 0".into(),
			));
		}

		let row = sqlx::query(
			"SELECT id, title, description, is_completed, created_at, updated_at \
			 FROM tasks WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&*self.pool)
		.await
		.map_err(|e| Error::store("select task", e))?;

		match row {
			Some(row) => task_from_row(&row),
			None => Err(Error::NotFound("task")),
		}
	}

	async fn get_all(&self) -> Result<Vec<Task>> {
		// fetch_all drains the cursor on every path before returning.
		let rows = sqlx::query(
			"SELECT id, title, description, is_completed, created_at, updated_at \
			 FROM tasks ORDER BY created_at DESC, id DESC",
		)
		.fetch_all(&*self.pool)
		.await
		.map_err(|e| Error::store("select tasks", e))?;

		rows.iter().map(task_from_row).collect()
	}

	async fn update(&self, task: Task) -> Result<Task> {
		let now = encode_timestamp(Utc::now());
		let result = sqlx::query(
			"UPDATE tasks SET title = ?, description = ?, is_completed = ?, updated_at = ? \
			 WHERE id = ?",
		)
		.bind(&task.title)
		.bind(&task.description)
		.bind(task.is_completed)
		.bind(&now)
		.bind(task.id)
		.execute(&*self.pool)
		.await
		.map_err(|e| Error::store("update task", e))?;

		if result.rows_affected() == 0 {
			return Err(Error::NotFound("task"));
		}

		self.get_by_id(task.id).await
	}

	async fn delete(&self, id: i64) -> Result<()> {
		let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
			.bind(id)
			.execute(&*self.pool)
			.await
			.map_err(|e| Error::store("delete task", e))?;

		if result.rows_affected() == 0 {
			return Err(Error::NotFound("task"));
		}

		Ok(())
	}
}

/// In-memory repository with the same observable semantics as the SQL
/// implementation. Used by the test suite and handy for local runs
/// without a database.
#[derive(Default)]
pub struct InMemoryTaskRepository {
	inner: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
	next_id: i64,
	rows: Vec<Task>,
}

impl InMemoryTaskRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
	async fn create(&self, task: Task) -> Result<Task> {
		let mut state = self.inner.lock().expect("repository lock poisoned");
		state.next_id += 1;
		let now = Utc::now();
		let stored = Task {
			id: state.next_id,
			title: task.title,
			description: task.description,
			is_completed: false,
			created_at: now,
			updated_at: now,
		};
		state.rows.push(stored.clone());
		Ok(stored)
	}

	async fn get_by_id(&self, id: i64) -> Result<Task> {
		if id <= 0 {
			return Err(Error::InvalidArgument(
				"task id must be greater than 0".into(),
			));
		}
		let state = self.inner.lock().expect("repository lock poisoned");
		state
			.rows
			.iter()
			.find(|t| t.id == id)
			.cloned()
			.ok_or(Error::NotFound("task"))
	}

	async fn get_all(&self) -> Result<Vec<Task>> {
		let state = self.inner.lock().expect("repository lock poisoned");
		let mut tasks = state.rows.clone();
		// Same ordering as the SQL query, with id as the tie-breaker for
		// rows created within one timestamp granule.
		tasks.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.id.cmp(&a.id))
		});
		Ok(tasks)
	}

	async fn update(&self, task: Task) -> Result<Task> {
		let mut state = self.inner.lock().expect("repository lock poisoned");
		let row = state
			.rows
			.iter_mut()
			.find(|t| t.id == task.id)
			.ok_or(Error::NotFound("task"))?;
		row.title = task.title;
		row.description = task.description;
		row.is_completed = task.is_completed;
		row.updated_at = Utc::now();
		Ok(row.clone())
	}

	async fn delete(&self, id: i64) -> Result<()> {
		let mut state = self.inner.lock().expect("repository lock poisoned");
		let before = state.rows.len();
		state.rows.retain(|t| t.id != id);
		if state.rows.len() == before {
			return Err(Error::NotFound("task"));
		}
		Ok(())
	}
}
