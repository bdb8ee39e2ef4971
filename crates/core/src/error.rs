use thiserror::Error;

use crate::driver::DriverError;

pub type Result<T> = std::result::Result<T, LoginError>;

#[derive(Debug, Error)]
pub enum LoginError {
	#[error("navigation failed: {url}")]
	Navigation {
		url: String,
		#[source]
		source: anyhow::Error,
	},

	#[error("element not found: {selector}")]
	ElementNotFound { selector: String },

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	/// Missing input is fatal: retrying cannot produce credentials.
	#[error("credentials unavailable{}", hint_suffix(.hint))]
	CredentialsUnavailable { hint: Option<String> },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Driver(#[from] DriverError),
}

fn hint_suffix(hint: &Option<String>) -> String {
	match hint {
		Some(hint) => format!(" for account hint: {hint}"),
		None => String::new(),
	}
}

impl LoginError {
	/// Transient failures are recovered locally by re-classification and
	/// counted against the current step's attempt budget; everything else
	/// propagates out of the handler boundary.
	pub fn is_transient(&self) -> bool {
		match self {
			LoginError::ElementNotFound { .. } | LoginError::Timeout { .. } | LoginError::Navigation { .. } => true,
			LoginError::Driver(err) => err.is_transient(),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transient_classification() {
		assert!(
			LoginError::ElementNotFound {
				selector: "#identifierId".into()
			}
			.is_transient()
		);
		assert!(
			LoginError::Timeout {
				ms: 5000,
				condition: "input[type='password']".into()
			}
			.is_transient()
		);
		assert!(!LoginError::CredentialsUnavailable { hint: None }.is_transient());
	}

	#[test]
	fn credentials_error_mentions_hint() {
		let err = LoginError::CredentialsUnavailable {
			hint: Some("work".into()),
		};
		assert!(err.to_string().contains("work"));
	}
}
