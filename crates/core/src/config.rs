//! Login attempt configuration.
//!
//! Everything the state machine needs to know up front lives here: the
//! target and provider URLs, the guard bounds, the timing policy, the
//! session age policy, and the browser launch data. The anti-fingerprint
//! material in [`BrowserConfig`] is configuration handed to the browser
//! session at launch, never logic inside handlers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry bounds owned by the loop guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardLimits {
	/// Total classify→dispatch iterations across the whole ceremony.
	pub max_iterations: u32,
	/// Consecutive non-advancing attempts tolerated on one step.
	pub max_attempts_per_step: u32,
}

impl Default for GuardLimits {
	fn default() -> Self {
		Self {
			max_iterations: 15,
			max_attempts_per_step: 3,
		}
	}
}

/// Static browser-context launch data.
///
/// Applied once by the browser session before any navigation; the first
/// request a provider sees must already carry these properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub locale: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timezone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub viewport: Option<(u32, u32)>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub launch_args: Vec<String>,
	/// Scripts installed before any page script runs, on every navigation.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub init_scripts: Vec<String>,
}

/// Masks the most common automation fingerprints: the `navigator.webdriver`
/// flag, the driver-injected `cdc_` globals, and the empty plugin/language
/// lists headless profiles ship with.
const WEBDRIVER_MASK: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

impl BrowserConfig {
	/// The production anti-fingerprinting profile.
	pub fn stealth() -> Self {
		Self {
			user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()),
			locale: Some("en-US".to_string()),
			timezone: Some("UTC".to_string()),
			viewport: Some((1366, 768)),
			launch_args: [
				"--no-sandbox",
				"--disable-dev-shm-usage",
				"--disable-gpu",
				"--disable-extensions",
				"--no-first-run",
				"--no-default-browser-check",
				"--disable-default-apps",
				"--disable-blink-features=AutomationControlled",
				"--disable-features=VizDisplayCompositor",
			]
			.iter()
			.map(|s| s.to_string())
			.collect(),
			init_scripts: vec![WEBDRIVER_MASK.trim().to_string()],
		}
	}
}

/// Full configuration for one login ceremony.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginConfig {
	/// Where the ceremony starts and where success is validated.
	pub entry_url: String,
	/// Identity-provider host; presence in a URL is a negative signal.
	pub provider_host: String,
	/// Direct sign-in URL used when the entry page exposes no sign-in
	/// control.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub signin_url: Option<String>,
	#[serde(default)]
	pub limits: GuardLimits,
	/// Upper bound for any single blocking browser call.
	pub step_timeout_ms: u64,
	/// Per-selector bound when probing for a snapshot.
	pub probe_timeout_ms: u64,
	/// Cadence of classify-and-poll waits.
	pub poll_interval_ms: u64,
	/// Budget for an out-of-band (push approval) two-factor resolution.
	pub two_factor_wait_ms: u64,
	/// Persisted sessions older than this are discarded whole.
	pub max_session_age_secs: u64,
	#[serde(default)]
	pub browser: BrowserConfig,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account_hint: Option<String>,
}

impl LoginConfig {
	pub fn new(entry_url: impl Into<String>, provider_host: impl Into<String>) -> Self {
		Self {
			entry_url: entry_url.into(),
			provider_host: provider_host.into(),
			..Self::default()
		}
	}

	pub fn step_timeout(&self) -> Duration {
		Duration::from_millis(self.step_timeout_ms)
	}

	pub fn probe_timeout(&self) -> Duration {
		Duration::from_millis(self.probe_timeout_ms)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn two_factor_wait(&self) -> Duration {
		Duration::from_millis(self.two_factor_wait_ms)
	}
}

impl Default for LoginConfig {
	fn default() -> Self {
		Self {
			entry_url: "https://aistudio.google.com/".to_string(),
			provider_host: "accounts.google.com".to_string(),
			signin_url: None,
			limits: GuardLimits::default(),
			step_timeout_ms: 30_000,
			probe_timeout_ms: 2_000,
			poll_interval_ms: 1_000,
			two_factor_wait_ms: 120_000,
			// Sessions observed to survive roughly a day; stay under it.
			max_session_age_secs: 12 * 3600,
			browser: BrowserConfig::stealth(),
			account_hint: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stealth_profile_masks_automation() {
		let browser = BrowserConfig::stealth();
		assert!(browser.launch_args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
		assert!(browser.init_scripts.iter().any(|s| s.contains("navigator, 'webdriver'")));
	}

	#[test]
	fn config_round_trips() {
		let config = LoginConfig::new("https://app.example.com/", "id.example.com");
		let json = serde_json::to_string(&config).unwrap();
		let restored: LoginConfig = serde_json::from_str(&json).unwrap();
		assert_eq!(restored.entry_url, "https://app.example.com/");
		assert_eq!(restored.provider_host, "id.example.com");
		assert_eq!(restored.limits, GuardLimits::default());
	}

	#[test]
	fn duration_accessors() {
		let config = LoginConfig::default();
		assert_eq!(config.step_timeout(), Duration::from_secs(30));
		assert_eq!(config.poll_interval(), Duration::from_secs(1));
	}
}
