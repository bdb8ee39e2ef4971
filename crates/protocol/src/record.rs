//! Persisted session material captured after a successful login.
//!
//! A [`SessionRecord`] is all-or-nothing: callers either apply every field
//! of a record whose age is within policy, or none of it. Partial
//! application of stale cookies is never valid.

use serde::{Deserialize, Serialize};

/// SameSite attribute carried on a captured cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	#[serde(rename = "None")]
	None,
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	#[serde(rename = "Strict")]
	Strict,
}

/// One cookie captured from (or restored into) a browser context.
///
/// Field names follow the driver wire format (camelCase) so a record
/// round-trips losslessly through save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieEntry {
	pub name: String,
	pub value: String,
	pub domain: String,
	#[serde(default = "default_path")]
	pub path: String,
	/// Unix seconds. Negative means session cookie, as drivers report it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

fn default_path() -> String {
	"/".to_string()
}

impl CookieEntry {
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: domain.into(),
			path: default_path(),
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	/// Returns true when the cookie has an expiry in the past.
	///
	/// Session cookies (no expiry, or a negative one) never report expired.
	pub fn is_expired(&self, now_secs: u64) -> bool {
		match self.expires {
			Some(ts) if ts >= 0.0 => (ts as u64) < now_secs,
			_ => false,
		}
	}
}

/// Session material captured after a successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	pub cookies: Vec<CookieEntry>,
	/// Opaque storage-state blob exactly as the driver produced it.
	pub storage_state: serde_json::Value,
	/// Unix seconds at capture time.
	pub captured_at: u64,
	/// Page URL at capture time.
	pub source_url: String,
}

impl SessionRecord {
	pub fn new(cookies: Vec<CookieEntry>, storage_state: serde_json::Value, captured_at: u64, source_url: impl Into<String>) -> Self {
		Self {
			cookies,
			storage_state,
			captured_at,
			source_url: source_url.into(),
		}
	}

	/// Seconds elapsed since capture. Saturates at zero for clock skew.
	pub fn age_secs(&self, now_secs: u64) -> u64 {
		now_secs.saturating_sub(self.captured_at)
	}

	/// Returns true when the record is older than `max_age_secs`.
	pub fn is_expired(&self, now_secs: u64, max_age_secs: u64) -> bool {
		self.age_secs(now_secs) > max_age_secs
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cookie_serializes_camel_case() {
		let mut cookie = CookieEntry::new("session", "token", ".example.com");
		cookie.http_only = Some(true);
		cookie.same_site = Some(SameSite::Lax);

		let json = serde_json::to_string(&cookie).unwrap();
		assert!(json.contains("\"httpOnly\":true"));
		assert!(json.contains("\"sameSite\":\"Lax\""));
	}

	#[test]
	fn cookie_session_expiry_never_expires() {
		let mut cookie = CookieEntry::new("s", "v", ".example.com");
		cookie.expires = Some(-1.0);
		assert!(!cookie.is_expired(u64::MAX));

		cookie.expires = Some(100.0);
		assert!(cookie.is_expired(101));
		assert!(!cookie.is_expired(99));
	}

	#[test]
	fn record_round_trips_losslessly() {
		let record = SessionRecord::new(
			vec![CookieEntry::new("sid", "abc", ".example.com")],
			serde_json::json!({ "origins": [{ "origin": "https://example.com", "localStorage": [] }] }),
			1_700_000_000,
			"https://example.com/app/",
		);

		let json = serde_json::to_string_pretty(&record).unwrap();
		let restored: SessionRecord = serde_json::from_str(&json).unwrap();

		assert_eq!(restored.cookies, record.cookies);
		assert_eq!(restored.storage_state, record.storage_state);
		assert_eq!(restored.captured_at, record.captured_at);
		assert_eq!(restored.source_url, record.source_url);
	}

	#[test]
	fn record_age_policy() {
		let record = SessionRecord::new(Vec::new(), serde_json::Value::Null, 1_000, "https://example.com/");

		// 30 hours old against a 24 hour bound.
		let now = 1_000 + 30 * 3600;
		assert!(record.is_expired(now, 24 * 3600));
		assert!(!record.is_expired(1_000 + 3600, 24 * 3600));
		// Clock skew: captured "in the future" is not expired.
		assert_eq!(record.age_secs(0), 0);
	}
}
