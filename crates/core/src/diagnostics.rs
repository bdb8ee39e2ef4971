//! Diagnostic screenshot checkpoints.
//!
//! Handlers capture screenshots before risky clicks and after step
//! transitions. Capture is best-effort by contract: a sink failure is
//! reported as `None` and must never abort the login attempt.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::driver::PageDriver;

#[async_trait]
pub trait ScreenshotSink: Send + Sync {
	/// Captures a labelled screenshot and returns its path, or `None` when
	/// capture failed or the sink is disabled.
	async fn capture(&self, label: &str) -> Option<PathBuf>;
}

/// Discards every capture request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl ScreenshotSink for NullSink {
	async fn capture(&self, _label: &str) -> Option<PathBuf> {
		None
	}
}

/// Writes labelled PNGs under one directory via the page driver.
pub struct DriverSink {
	driver: Arc<dyn PageDriver>,
	dir: PathBuf,
}

impl DriverSink {
	pub fn new(driver: Arc<dyn PageDriver>, dir: impl Into<PathBuf>) -> Self {
		Self { driver, dir: dir.into() }
	}
}

#[async_trait]
impl ScreenshotSink for DriverSink {
	async fn capture(&self, label: &str) -> Option<PathBuf> {
		let path = self.dir.join(format!("{}.png", sanitize(label)));
		if let Some(parent) = path.parent() {
			if let Err(err) = std::fs::create_dir_all(parent) {
				debug!(target = "authflow", path = %path.display(), error = %err, "screenshot dir unavailable, skipping");
				return None;
			}
		}
		match self.driver.screenshot(&path).await {
			Ok(()) => Some(path),
			Err(err) => {
				debug!(target = "authflow", label, error = %err, "screenshot capture failed, continuing");
				None
			}
		}
	}
}

fn sanitize(label: &str) -> String {
	label
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn labels_become_safe_filenames() {
		assert_eq!(sanitize("before-account_click"), "before-account_click");
		assert_eq!(sanitize("2fa: code/prompt"), "2fa__code_prompt");
	}

	#[tokio::test]
	async fn null_sink_captures_nothing() {
		assert_eq!(NullSink.capture("anything").await, None);
	}
}
