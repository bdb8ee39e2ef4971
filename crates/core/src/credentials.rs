//! Injected credential lookup.
//!
//! The state machine reads credentials, it never owns them: no parsing of
//! configuration files or environment variables here, and nothing in this
//! module is persisted or logged.

use std::fmt;

use async_trait::async_trait;

/// One account's login material.
#[derive(Clone)]
pub struct Credentials {
	pub email: String,
	pub password: String,
	pub account_hint: Option<String>,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
			account_hint: None,
		}
	}

	/// Local part of the email, used for partial account-row matching.
	pub fn local_part(&self) -> &str {
		self.email.split('@').next().unwrap_or(&self.email)
	}
}

// Manual impl: the password must never reach logs or error chains.
impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"[redacted]")
			.field("account_hint", &self.account_hint)
			.finish()
	}
}

/// External credential source.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
	/// Returns credentials for the hinted account, or `None` when the
	/// source has nothing usable. `None` is fatal to a login attempt.
	async fn credentials(&self, account_hint: Option<&str>) -> Option<Credentials>;
}

/// Fixed in-memory credentials for embedding and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

#[async_trait]
impl CredentialsProvider for StaticCredentials {
	async fn credentials(&self, account_hint: Option<&str>) -> Option<Credentials> {
		// A mismatched hint means these credentials are for the wrong
		// account; surfacing nothing beats logging in as the wrong user.
		if let Some(hint) = account_hint {
			let matches = self.0.email.contains(hint) || self.0.account_hint.as_deref() == Some(hint);
			if !matches {
				return None;
			}
		}
		Some(self.0.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_redacts_password() {
		let creds = Credentials::new("user@example.com", "hunter2");
		let rendered = format!("{creds:?}");
		assert!(rendered.contains("user@example.com"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn local_part_splits_email() {
		let creds = Credentials::new("user.name@example.com", "pw");
		assert_eq!(creds.local_part(), "user.name");
	}

	#[tokio::test]
	async fn static_provider_honors_hint() {
		let provider = StaticCredentials(Credentials::new("user@example.com", "pw"));
		assert!(provider.credentials(None).await.is_some());
		assert!(provider.credentials(Some("user")).await.is_some());
		assert!(provider.credentials(Some("someone-else")).await.is_none());
	}
}
