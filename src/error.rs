use hyper::StatusCode;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy for the whole request pipeline.
///
/// The repository only ever produces `NotFound`, `InvalidArgument` and
/// `Store`; the service layer adds `Validation`; the router adds
/// `MethodNotAllowed`. Anything that escapes all of those is `Unexpected`
/// and only the recovery middleware turns it into a response.
#[derive(Debug, Error)]
pub enum Error {
	#[error("validation failed: {0}")]
	Validation(String),

	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("method not allowed")]
	MethodNotAllowed {
		/// Comma-separated verb list for the `Allow` response header.
		allow: &'static str,
	},

	#[error("store error during {op}: {source}")]
	Store {
		op: &'static str,
		#[source]
		source: sqlx::Error,
	},

	#[error("configuration error: {0}")]
	Config(String),

	#[error("unexpected error: {0}")]
	Unexpected(String),
}

impl Error {
	pub fn store(op: &'static str, source: sqlx::Error) -> Self {
		Self::Store { op, source }
	}

	/// HTTP status this error surfaces as.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(_) | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
			Self::Store { .. } | Self::Config(_) | Self::Unexpected(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Message safe to put in a response body.
	///
	/// Store and unexpected failures get a generic line; the full error is
	/// logged server-side only.
	pub fn public_message(&self) -> String {
		match self {
			Self::Validation(_) => "validation failed".to_string(),
			Self::InvalidArgument(_) => "invalid request".to_string(),
			Self::NotFound(what) => format!("{what} not found"),
			Self::MethodNotAllowed { .. } => "method not allowed".to_string(),
			Self::Store { .. } | Self::Config(_) | Self::Unexpected(_) => {
				"internal server error".to_string()
			}
		}
	}

	/// Human-readable detail for 4xx responses, `None` where detail would
	/// leak internals.
	pub fn public_details(&self) -> Option<String> {
		match self {
			Self::Validation(details) | Self::InvalidArgument(details) => Some(details.clone()),
			_ => None,
		}
	}
}
