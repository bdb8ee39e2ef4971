//! Narrow browser capability surface the state machine drives.
//!
//! The core depends on exactly this trait, not on an automation library.
//! Implementations adapt whatever drives the real browser (a Playwright
//! server connection, CDP, a scripted fake in tests) to these primitives.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use authflow_protocol::record::CookieEntry;
use thiserror::Error;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Failures a driver distinguishes for the handler boundary.
///
/// `Timeout` and `NotFound` are transient: indistinguishable from slow
/// renders without a retry, so handlers count them against the step budget
/// instead of failing the attempt.
#[derive(Debug, Error)]
pub enum DriverError {
	#[error("timeout after {ms}ms: {operation}")]
	Timeout { ms: u64, operation: String },

	#[error("no element matched selector: {selector}")]
	NotFound { selector: String },

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl DriverError {
	pub fn is_transient(&self) -> bool {
		matches!(self, DriverError::Timeout { .. } | DriverError::NotFound { .. })
	}
}

/// One live browser page plus its owning context.
///
/// All calls are sequential and carry explicit timeouts where they can
/// block on page state. The state machine never holds more than one
/// operation in flight.
#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Navigates the page and waits for the load to settle.
	async fn goto(&self, url: &str, timeout: Duration) -> DriverResult<()>;

	async fn current_url(&self) -> DriverResult<String>;

	/// Visible text content of the page body.
	async fn visible_text(&self) -> DriverResult<String>;

	/// Returns whether `selector` matches a visible element within `timeout`.
	async fn is_visible(&self, selector: &str, timeout: Duration) -> DriverResult<bool>;

	async fn click(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

	/// Gives the element real keyboard focus (some providers ignore
	/// activation without it).
	async fn focus(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

	/// Empties the field's current value.
	async fn clear(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

	/// Types `text` into the element keystroke by keystroke.
	async fn type_text(&self, selector: &str, text: &str, timeout: Duration) -> DriverResult<()>;

	/// Presses a named key (e.g. `"Enter"`) with the element focused.
	async fn press(&self, selector: &str, key: &str) -> DriverResult<()>;

	/// Evaluates a script in the page and returns its JSON result.
	async fn eval(&self, script: &str) -> DriverResult<serde_json::Value>;

	/// Registers a script to run before any page script on every
	/// navigation. Must be called before the first `goto`.
	async fn add_init_script(&self, script: &str) -> DriverResult<()>;

	async fn add_cookies(&self, cookies: &[CookieEntry]) -> DriverResult<()>;

	async fn cookies(&self) -> DriverResult<Vec<CookieEntry>>;

	/// Opaque storage-state blob for the whole context.
	async fn storage_state(&self) -> DriverResult<serde_json::Value>;

	async fn screenshot(&self, path: &Path) -> DriverResult<()>;

	/// Releases the context and the OS-level browser resources behind it.
	async fn close(&self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transient_variants() {
		assert!(
			DriverError::Timeout {
				ms: 1000,
				operation: "click".into()
			}
			.is_transient()
		);
		assert!(
			DriverError::NotFound {
				selector: "button".into()
			}
			.is_transient()
		);
		assert!(!DriverError::Other(anyhow::anyhow!("connection lost")).is_transient());
	}
}
