//! Browser session owned by one login attempt.
//!
//! [`LoginSession`] wraps the injected [`PageDriver`] with the typed
//! action surface step handlers use, builds [`PageSnapshot`]s, and owns
//! the ordering rules that matter to the provider: anti-fingerprinting
//! patches are installed before the first navigation, and persisted
//! cookies are restored before the first navigation, because the very
//! first request may already be fingerprinted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use authflow_protocol::record::SessionRecord;
use authflow_protocol::snapshot::PageSnapshot;
use tracing::debug;

use crate::config::{BrowserConfig, LoginConfig};
use crate::diagnostics::ScreenshotSink;
use crate::driver::{DriverError, PageDriver};
use crate::error::{LoginError, Result};
use crate::store::now_ts;

pub struct LoginSession {
	driver: Arc<dyn PageDriver>,
	sink: Arc<dyn ScreenshotSink>,
	step_timeout: Duration,
	probe_timeout: Duration,
}

impl LoginSession {
	pub fn new(driver: Arc<dyn PageDriver>, sink: Arc<dyn ScreenshotSink>, config: &LoginConfig) -> Self {
		Self {
			driver,
			sink,
			step_timeout: config.step_timeout(),
			probe_timeout: config.probe_timeout(),
		}
	}

	/// Installs the configured init scripts.
	///
	/// Launch args, user agent, and viewport in [`BrowserConfig`] are
	/// launch-time data the embedder consumes when constructing the
	/// driver; the patch scripts are the part this session can still apply,
	/// and it must happen before any [`goto`](Self::goto).
	pub async fn initialize(&self, browser: &BrowserConfig) -> Result<()> {
		for script in &browser.init_scripts {
			self.driver.add_init_script(script).await?;
		}
		Ok(())
	}

	/// Restores persisted cookies into the context.
	///
	/// Callers must invoke this before the first navigation; a record is
	/// applied whole or not at all, which the store already guarantees.
	pub async fn apply_record(&self, record: &SessionRecord) -> Result<()> {
		debug!(target = "authflow", cookies = record.cookies.len(), source = %record.source_url, "restoring persisted session");
		self.driver.add_cookies(&record.cookies).await?;
		Ok(())
	}

	/// Captures the context's current session material.
	pub async fn capture_record(&self) -> Result<SessionRecord> {
		let cookies = self.driver.cookies().await?;
		let storage_state = self.driver.storage_state().await?;
		let source_url = self.driver.current_url().await?;
		Ok(SessionRecord::new(cookies, storage_state, now_ts(), source_url))
	}

	pub async fn goto(&self, url: &str) -> Result<()> {
		self.driver.goto(url, self.step_timeout).await.map_err(|err| match err {
			DriverError::Timeout { ms, .. } => LoginError::Timeout {
				ms,
				condition: format!("navigation to {url}"),
			},
			other => LoginError::Navigation {
				url: url.to_string(),
				source: anyhow::Error::new(other),
			},
		})
	}

	/// Builds a fresh snapshot: URL, visible text, and one presence probe
	/// per declared selector. A probe that times out counts as absent, not
	/// as an error; transient render delays must not abort classification.
	pub async fn snapshot(&self, probes: &[String]) -> Result<PageSnapshot> {
		let url = self.driver.current_url().await?;
		let text = self.driver.visible_text().await.unwrap_or_default();
		let mut snapshot = PageSnapshot::new(url, text);

		for selector in probes {
			let present = match self.driver.is_visible(selector, self.probe_timeout).await {
				Ok(present) => present,
				Err(err) if err.is_transient() => false,
				Err(err) => return Err(err.into()),
			};
			snapshot.record_probe(selector.clone(), present);
		}

		Ok(snapshot)
	}

	/// Returns whether `selector` is visible right now (short probe bound).
	pub async fn is_visible(&self, selector: &str) -> Result<bool> {
		match self.driver.is_visible(selector, self.probe_timeout).await {
			Ok(present) => Ok(present),
			Err(err) if err.is_transient() => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	pub async fn click(&self, selector: &str) -> Result<()> {
		self.driver.click(selector, self.step_timeout).await.map_err(|err| convert(err, selector))
	}

	pub async fn focus(&self, selector: &str) -> Result<()> {
		self.driver.focus(selector, self.step_timeout).await.map_err(|err| convert(err, selector))
	}

	/// Clear-then-type fill discipline.
	///
	/// Overwriting an existing value in place mis-fires the provider's
	/// "changed" handlers; the field is cleared first, then typed into.
	pub async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
		self.driver.focus(selector, self.step_timeout).await.map_err(|err| convert(err, selector))?;
		self.driver.clear(selector, self.step_timeout).await.map_err(|err| convert(err, selector))?;
		self.driver
			.type_text(selector, value, self.step_timeout)
			.await
			.map_err(|err| convert(err, selector))
	}

	pub async fn press(&self, selector: &str, key: &str) -> Result<()> {
		self.driver.press(selector, key).await.map_err(|err| convert(err, selector))
	}

	pub async fn eval(&self, script: &str) -> Result<serde_json::Value> {
		Ok(self.driver.eval(script).await?)
	}

	pub async fn current_url(&self) -> Result<String> {
		Ok(self.driver.current_url().await?)
	}

	/// Best-effort diagnostic screenshot; never fails.
	pub async fn capture(&self, label: &str) -> Option<PathBuf> {
		self.sink.capture(label).await
	}

	/// Releases the browser context. Required on every exit path; a leaked
	/// context is a leaked OS-level browser process.
	pub async fn close(&self) -> Result<()> {
		self.driver.close().await?;
		Ok(())
	}
}

fn convert(err: DriverError, selector: &str) -> LoginError {
	match err {
		DriverError::NotFound { .. } => LoginError::ElementNotFound {
			selector: selector.to_string(),
		},
		DriverError::Timeout { ms, .. } => LoginError::Timeout {
			ms,
			condition: selector.to_string(),
		},
		other => LoginError::Driver(other),
	}
}
