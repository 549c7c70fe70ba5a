//! Environment-driven runtime settings.

use std::net::SocketAddr;

use crate::error::{Error, Result};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct Settings {
	pub server_addr: SocketAddr,
	pub database_url: String,
	pub db_max_connections: u32,
}

impl Settings {
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Unset variables fall back to defaults; set-but-invalid values are
	/// configuration errors rather than silent fallbacks.
	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let server_addr = match lookup("SERVER_ADDR") {
			Some(raw) => raw
				.parse::<SocketAddr>()
				.map_err(|_| Error::Config(format!("SERVER_ADDR is not a socket address: {raw}")))?,
			None => DEFAULT_SERVER_ADDR
				.parse()
				.map_err(|_| Error::Config("default server address is invalid".into()))?,
		};

		let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
		if database_url.is_empty() {
			return Err(Error::Config("DATABASE_URL must not be empty".into()));
		}

		let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
			Some(raw) => raw
				.parse::<u32>()
				.ok()
				.filter(|&n| n > 0)
				.ok_or_else(|| {
					Error::Config(format!("DB_MAX_CONNECTIONS must be a positive integer: {raw}"))
				})?,
			None => DEFAULT_DB_MAX_CONNECTIONS,
		};

		Ok(Self {
			server_addr,
			database_url,
			db_max_connections,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		Settings::from_lookup(|key| map.get(key).cloned())
	}

	#[test]
	fn defaults_apply_when_nothing_is_set() {
		let settings = settings_from(&[]).unwrap();
		assert_eq!(settings.server_addr.to_string(), "0.0.0.0:8080");
		assert_eq!(settings.database_url, "sqlite::memory:");
		assert_eq!(settings.db_max_connections, 10);
	}

	#[test]
	fn explicit_values_override_defaults() {
		let settings = settings_from(&[
			("SERVER_ADDR", "127.0.0.1:9090"),
			("DATABASE_URL", "sqlite://tasks.db"),
			("DB_MAX_CONNECTIONS", "32"),
		])
		.unwrap();
		assert_eq!(settings.server_addr.to_string(), "127.0.0.1:9090");
		assert_eq!(settings.database_url, "sqlite://tasks.db");
		assert_eq!(settings.db_max_connections, 32);
	}

	#[rstest::rstest]
	#[case(&[("SERVER_ADDR", "not-an-addr")])]
	#[case(&[("DATABASE_URL", "")])]
	#[case(&[("DB_MAX_CONNECTIONS", "0")])]
	#[case(&[("DB_MAX_CONNECTIONS", "many")])]
	fn invalid_values_are_config_errors(#[case] vars: &[(&str, &str)]) {
		let err = settings_from(vars).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}
}
