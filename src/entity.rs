use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum title length in characters, after trimming.
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// The task entity.
///
/// `id` is assigned by the store on creation and never reused after
/// deletion. `created_at` is set once; `updated_at` is refreshed by the
/// store on every successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub is_completed: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Task {
	/// New unpersisted task. The store assigns `id` and the authoritative
	/// timestamps on create.
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: 0,
			title: title.into(),
			description: description.into(),
			is_completed: false,
			created_at: now,
			updated_at: now,
		}
	}

	/// Trims surrounding whitespace off the title. Runs before validation
	/// so `"  "` is rejected as empty rather than accepted as two chars.
	pub fn normalize(&mut self) {
		self.title = self.title.trim().to_string();
	}

	/// Checks the entity invariants, returning a field-naming
	/// `Error::Validation` on the first violation.
	pub fn validate(&self) -> Result<()> {
		let title_len = self.title.trim().chars().count();
		if title_len == 0 {
			return Err(Error::Validation("title is required".into()));
		}
		if title_len > TITLE_MAX_CHARS {
			return Err(Error::Validation(format!(
				"title must be {TITLE_MAX_CHARS} characters or less"
			)));
		}
		if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
			return Err(Error::Validation(format!(
				"description must be {DESCRIPTION_MAX_CHARS} characters or less"
			)));
		}
		Ok(())
	}

	pub fn mark_completed(&mut self) {
		self.is_completed = true;
	}

	pub fn mark_incomplete(&mut self) {
		self.is_completed = false;
	}
}
