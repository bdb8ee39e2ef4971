//! Page classification: which step of the ceremony is this page?
//!
//! Classification is an ordered, prioritized rule table. Each rule binds
//! to exactly one [`StepKind`]; within a rule the predicates are OR-ed,
//! across rules the first match wins. Priority order is load-bearing:
//! concrete structural signals (a specific input selector, a provider URL
//! shape) sit above loose textual signals, because words like
//! "verification" also appear in unrelated page copy.
//!
//! No rule matching is not an error. It produces [`StepKind::Unknown`]
//! with zero matched signals, which the loop guard handles as a bounded
//! wait-and-reclassify.

mod rules;

use std::fmt;

use authflow_protocol::snapshot::PageSnapshot;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

pub use rules::default_rules;

/// The ceremony step a page represents. Exactly one per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
	Unauthenticated,
	AccountChooser,
	EmailEntry,
	PasswordEntry,
	TwoFactorChallenge,
	Authenticated,
	Unknown,
}

impl fmt::Display for StepKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			StepKind::Unauthenticated => "unauthenticated",
			StepKind::AccountChooser => "account-chooser",
			StepKind::EmailEntry => "email-entry",
			StepKind::PasswordEntry => "password-entry",
			StepKind::TwoFactorChallenge => "two-factor-challenge",
			StepKind::Authenticated => "authenticated",
			StepKind::Unknown => "unknown",
		};
		f.write_str(name)
	}
}

/// One independently checkable piece of page evidence.
#[derive(Debug, Clone)]
pub enum Predicate {
	UrlContains(String),
	UrlMatches(Regex),
	TextContains(String),
	SelectorPresent(String),
}

impl Predicate {
	pub fn url(needle: impl Into<String>) -> Self {
		Predicate::UrlContains(needle.into())
	}

	/// Panics on an invalid pattern; rule tables are built from constants.
	pub fn url_pattern(pattern: &str) -> Self {
		Predicate::UrlMatches(Regex::new(pattern).expect("invalid rule URL pattern"))
	}

	pub fn text(needle: impl Into<String>) -> Self {
		Predicate::TextContains(needle.into())
	}

	pub fn selector(selector: impl Into<String>) -> Self {
		Predicate::SelectorPresent(selector.into())
	}

	/// Evaluates this predicate against one snapshot.
	pub fn matches(&self, snapshot: &PageSnapshot) -> bool {
		match self {
			Predicate::UrlContains(needle) => snapshot.url_contains(needle),
			Predicate::UrlMatches(pattern) => pattern.is_match(&snapshot.url),
			Predicate::TextContains(needle) => snapshot.text_contains(needle),
			Predicate::SelectorPresent(selector) => snapshot.has_selector(selector),
		}
	}

	fn describe(&self) -> String {
		match self {
			Predicate::UrlContains(needle) => format!("url:{needle}"),
			Predicate::UrlMatches(pattern) => format!("url~{}", pattern.as_str()),
			Predicate::TextContains(needle) => format!("text:{needle}"),
			Predicate::SelectorPresent(selector) => format!("selector:{selector}"),
		}
	}
}

/// One evaluated signal, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
	pub name: String,
	pub matched: bool,
}

/// The result of one classification pass. Fresh per call, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
	pub kind: StepKind,
	pub signals: Vec<Signal>,
	pub url: String,
}

impl Classification {
	pub fn matched_count(&self) -> usize {
		self.signals.iter().filter(|s| s.matched).count()
	}
}

/// One prioritized rule binding page evidence to a step.
#[derive(Debug, Clone)]
pub struct Rule {
	pub name: &'static str,
	pub kind: StepKind,
	pub predicates: Vec<Predicate>,
	/// Why this rule sits where it does in the priority order.
	pub rationale: &'static str,
}

impl Rule {
	pub fn new(name: &'static str, kind: StepKind, predicates: Vec<Predicate>, rationale: &'static str) -> Self {
		Self {
			name,
			kind,
			predicates,
			rationale,
		}
	}
}

/// Ordered first-match-wins rule evaluator.
#[derive(Debug, Clone)]
pub struct Classifier {
	rules: Vec<Rule>,
}

impl Classifier {
	pub fn new(rules: Vec<Rule>) -> Self {
		Self { rules }
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Every selector any rule probes; the snapshot builder collects these.
	pub fn selectors(&self) -> Vec<String> {
		let mut seen = Vec::new();
		for rule in &self.rules {
			for predicate in &rule.predicates {
				if let Predicate::SelectorPresent(selector) = predicate {
					if !seen.contains(selector) {
						seen.push(selector.clone());
					}
				}
			}
		}
		seen
	}

	/// Classifies one snapshot. Signals record every predicate evaluated,
	/// in order, up to and including the winning one.
	pub fn classify(&self, snapshot: &PageSnapshot) -> Classification {
		let mut signals = Vec::new();

		for rule in &self.rules {
			for predicate in &rule.predicates {
				let matched = predicate.matches(snapshot);
				signals.push(Signal {
					name: predicate.describe(),
					matched,
				});
				if matched {
					return Classification {
						kind: rule.kind,
						signals,
						url: snapshot.url.clone(),
					};
				}
			}
		}

		Classification {
			kind: StepKind::Unknown,
			signals,
			url: snapshot.url.clone(),
		}
	}
}

impl Default for Classifier {
	fn default() -> Self {
		Self::new(default_rules())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn classifier() -> Classifier {
		Classifier::default()
	}

	#[test]
	fn account_chooser_url_and_row_selector() {
		let mut snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/accountchooser?continue=x", "Choose an account");
		snapshot.record_probe("[data-identifier]", true);

		let classification = classifier().classify(&snapshot);
		assert_eq!(classification.kind, StepKind::AccountChooser);
		assert!(classification.matched_count() >= 1);
	}

	#[test]
	fn password_url_and_visible_input() {
		let mut snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/challenge/pwd?TL=x", "Welcome");
		snapshot.record_probe("input[type='password']", true);

		let classification = classifier().classify(&snapshot);
		assert_eq!(classification.kind, StepKind::PasswordEntry);
	}

	#[test]
	fn priority_order_is_total() {
		// A page carrying both password and email evidence resolves to the
		// higher-priority password rule, every time.
		let mut snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/challenge/pwd", "Enter your password");
		snapshot.record_probe("input[type='password']", true);
		snapshot.record_probe("input[type='email']", true);

		let classification = classifier().classify(&snapshot);
		assert_eq!(classification.kind, StepKind::PasswordEntry);
	}

	#[test]
	fn code_input_outranks_password_input() {
		// A totp page may keep a hidden password field in the DOM; the
		// concrete code-input selector must win.
		let mut snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/challenge/totp", "Enter the code");
		snapshot.record_probe("input[name='totpPin']", true);
		snapshot.record_probe("input[type='password']", true);

		let classification = classifier().classify(&snapshot);
		assert_eq!(classification.kind, StepKind::TwoFactorChallenge);
	}

	#[test]
	fn challenge_url_family_matches() {
		for challenge in ["totp", "ipp", "az", "dp"] {
			let snapshot = PageSnapshot::new(format!("https://accounts.google.com/v3/signin/challenge/{challenge}"), "");
			assert_eq!(classifier().classify(&snapshot).kind, StepKind::TwoFactorChallenge, "challenge/{challenge}");
		}
	}

	#[test]
	fn email_page_via_versioned_url() {
		let snapshot = PageSnapshot::new("https://accounts.google.com/signin/v2/identifier?continue=x", "Sign in");
		assert_eq!(classifier().classify(&snapshot).kind, StepKind::EmailEntry);
	}

	#[test]
	fn landing_page_cta_is_unauthenticated() {
		let snapshot = PageSnapshot::new("https://aistudio.google.com/", "Build with the latest models. Get started");
		assert_eq!(classifier().classify(&snapshot).kind, StepKind::Unauthenticated);
	}

	#[test]
	fn app_url_is_authenticated() {
		let snapshot = PageSnapshot::new("https://aistudio.google.com/u/3/prompts/new_chat", "New chat");
		assert_eq!(classifier().classify(&snapshot).kind, StepKind::Authenticated);
	}

	#[test]
	fn no_evidence_is_unknown_with_zero_matches() {
		let snapshot = PageSnapshot::new("https://example.com/interstitial", "one moment please");
		let classification = classifier().classify(&snapshot);
		assert_eq!(classification.kind, StepKind::Unknown);
		assert_eq!(classification.matched_count(), 0);
		assert!(!classification.signals.is_empty());
	}

	#[test]
	fn selector_collection_deduplicates() {
		let selectors = classifier().selectors();
		let mut unique = selectors.clone();
		unique.dedup();
		assert_eq!(selectors, unique);
		assert!(selectors.iter().any(|s| s == "input[type='password']"));
	}
}
