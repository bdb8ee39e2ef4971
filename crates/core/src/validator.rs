//! Multi-signal authentication verdicts.
//!
//! A single check cannot tell "logged in" from "logged out" on these
//! pages, so the validator scores signed indicators. Negative indicators
//! are structural evidence of a login wall and veto everything: a false
//! "authenticated" verdict sends callers past login into failures deep in
//! unrelated code, while a false "not authenticated" merely costs one
//! idempotent extra login attempt. Zero matched indicators is never
//! success.

use authflow_protocol::snapshot::PageSnapshot;

use crate::classify::Predicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
	Positive,
	Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
	/// Page structure: URL shape, post-login-only elements.
	Structural,
	/// Page wording; cheaper for the provider to change, weaker evidence.
	Textual,
}

/// One scored indicator.
#[derive(Debug, Clone)]
pub struct Indicator {
	pub name: &'static str,
	pub predicate: Predicate,
	pub polarity: Polarity,
	pub strength: Strength,
}

impl Indicator {
	pub fn new(name: &'static str, predicate: Predicate, polarity: Polarity, strength: Strength) -> Self {
		Self {
			name,
			predicate,
			polarity,
			strength,
		}
	}
}

/// Signed-signal scoring over a declarative indicator table.
#[derive(Debug, Clone)]
pub struct SessionValidator {
	indicators: Vec<Indicator>,
}

impl SessionValidator {
	pub fn new(indicators: Vec<Indicator>) -> Self {
		Self { indicators }
	}

	/// Default indicators for the observed product + provider pair.
	pub fn default_indicators(provider_host: &str) -> Vec<Indicator> {
		use Polarity::*;
		use Strength::*;
		vec![
			// Redirect onto the identity provider is the strongest possible
			// "not logged in" evidence.
			Indicator::new("provider-redirect", Predicate::url(provider_host.to_string()), Negative, Structural),
			Indicator::new("signin-cta-copy", Predicate::text("sign in"), Negative, Textual),
			Indicator::new("get-started-copy", Predicate::text("get started"), Negative, Textual),
			Indicator::new("signin-cta-control", Predicate::selector("[data-value='sign_in']"), Negative, Structural),
			Indicator::new("app-url", Predicate::url("/app/"), Positive, Structural),
			Indicator::new("prompts-url", Predicate::url("/prompts/"), Positive, Structural),
			Indicator::new("app-navigation", Predicate::selector("a[href*='/app/']"), Positive, Structural),
			Indicator::new("account-menu", Predicate::selector("button[aria-label*='account']"), Positive, Structural),
			Indicator::new("new-chat-copy", Predicate::text("new chat"), Positive, Textual),
			Indicator::new("history-copy", Predicate::text("history"), Positive, Textual),
			Indicator::new("dashboard-copy", Predicate::text("dashboard"), Positive, Textual),
		]
	}

	/// Selectors the indicator table probes; merged into snapshot probes.
	pub fn selectors(&self) -> Vec<String> {
		let mut seen = Vec::new();
		for indicator in &self.indicators {
			if let Predicate::SelectorPresent(selector) = &indicator.predicate {
				if !seen.contains(selector) {
					seen.push(selector.clone());
				}
			}
		}
		seen
	}

	/// Decides "authenticated" for one snapshot.
	///
	/// Any matched negative indicator wins outright. Otherwise the page is
	/// authenticated iff at least two positives matched, or one structural
	/// positive did.
	pub fn is_authenticated(&self, snapshot: &PageSnapshot) -> bool {
		let negative = self
			.indicators
			.iter()
			.filter(|i| i.polarity == Polarity::Negative)
			.any(|i| i.predicate.matches(snapshot));
		if negative {
			return false;
		}

		let mut positives = 0usize;
		let mut structural = false;
		for indicator in self.indicators.iter().filter(|i| i.polarity == Polarity::Positive) {
			if indicator.predicate.matches(snapshot) {
				positives += 1;
				structural |= indicator.strength == Strength::Structural;
			}
		}

		positives >= 2 || structural
	}
}

impl Default for SessionValidator {
	fn default() -> Self {
		Self::new(Self::default_indicators("accounts.google.com"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn validator() -> SessionValidator {
		SessionValidator::default()
	}

	#[test]
	fn negative_copy_overrides_positive_structure() {
		// "Get started" on the page vetoes even two structural positives.
		let mut snapshot = PageSnapshot::new("https://aistudio.google.com/app/home", "Get started");
		snapshot.record_probe("a[href*='/app/']", true);

		assert!(!validator().is_authenticated(&snapshot));
	}

	#[test]
	fn provider_redirect_is_never_authenticated() {
		let snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/identifier", "Welcome");
		assert!(!validator().is_authenticated(&snapshot));
	}

	#[test]
	fn two_textual_positives_suffice() {
		let snapshot = PageSnapshot::new("https://aistudio.example.net/home", "New chat \u{2022} History");
		assert!(validator().is_authenticated(&snapshot));
	}

	#[test]
	fn one_structural_positive_suffices() {
		let mut snapshot = PageSnapshot::new("https://aistudio.example.net/home", "welcome back");
		snapshot.record_probe("a[href*='/app/']", true);
		assert!(validator().is_authenticated(&snapshot));
	}

	#[test]
	fn one_textual_positive_is_not_enough() {
		let snapshot = PageSnapshot::new("https://aistudio.example.net/home", "your history");
		assert!(!validator().is_authenticated(&snapshot));
	}

	#[test]
	fn no_signal_is_not_authenticated() {
		// The unsafe legacy default was "no indicator found, assume logged
		// in"; the inverse is load-bearing here.
		let snapshot = PageSnapshot::new("https://aistudio.example.net/blank", "");
		assert!(!validator().is_authenticated(&snapshot));
	}
}
