//! Read-only page evidence used to classify the current ceremony step.

use serde::{Deserialize, Serialize};

/// Presence result for one probed selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorProbe {
	pub selector: String,
	pub present: bool,
}

/// Immutable snapshot of one page state.
///
/// Produced fresh for every loop iteration and replaced, never mutated.
/// Text matching is case-insensitive; the page text is stored lowercased
/// once so rule evaluation stays allocation-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
	pub url: String,
	/// Visible page text, lowercased.
	pub text: String,
	/// Presence result for each selector probed when the snapshot was built.
	pub selectors: Vec<SelectorProbe>,
}

impl PageSnapshot {
	pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			text: text.into().to_lowercase(),
			selectors: Vec::new(),
		}
	}

	/// Records a probe result. Later entries win on duplicate selectors.
	pub fn record_probe(&mut self, selector: impl Into<String>, present: bool) {
		self.selectors.push(SelectorProbe {
			selector: selector.into(),
			present,
		});
	}

	/// Returns true when `selector` was probed and found present.
	///
	/// Unprobed selectors report absent: evidence that was never collected
	/// must not count as a match.
	pub fn has_selector(&self, selector: &str) -> bool {
		self.selectors.iter().rev().find(|p| p.selector == selector).is_some_and(|p| p.present)
	}

	/// Case-insensitive substring check against the visible page text.
	pub fn text_contains(&self, needle: &str) -> bool {
		self.text.contains(&needle.to_lowercase())
	}

	pub fn url_contains(&self, needle: &str) -> bool {
		self.url.contains(needle)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_matching_is_case_insensitive() {
		let snapshot = PageSnapshot::new("https://example.com/", "Welcome back. Get Started today!");
		assert!(snapshot.text_contains("get started"));
		assert!(snapshot.text_contains("WELCOME"));
		assert!(!snapshot.text_contains("sign in"));
	}

	#[test]
	fn unprobed_selectors_report_absent() {
		let mut snapshot = PageSnapshot::new("https://example.com/", "");
		assert!(!snapshot.has_selector("input[type='email']"));

		snapshot.record_probe("input[type='email']", true);
		snapshot.record_probe("input[type='password']", false);
		assert!(snapshot.has_selector("input[type='email']"));
		assert!(!snapshot.has_selector("input[type='password']"));
	}

	#[test]
	fn duplicate_probes_take_latest_result() {
		let mut snapshot = PageSnapshot::new("https://example.com/", "");
		snapshot.record_probe("#identifierId", false);
		snapshot.record_probe("#identifierId", true);
		assert!(snapshot.has_selector("#identifierId"));
	}
}
