//! Default rule table for the observed identity provider.
//!
//! Every provider quirk becomes one more entry here, never a new code
//! path. Order is priority: structural evidence first, textual evidence
//! last.

use super::{Predicate, Rule, StepKind};

pub fn default_rules() -> Vec<Rule> {
	vec![
		Rule::new(
			"totp-input",
			StepKind::TwoFactorChallenge,
			vec![
				Predicate::selector("input[name='totpPin']"),
				Predicate::selector("input[autocomplete='one-time-code']"),
				Predicate::url_pattern(r"challenge/(totp|ipp|az|dp)"),
			],
			"concrete code-input selectors and the provider's challenge URL family; checked before anything textual because 'verification' also appears in help copy",
		),
		Rule::new(
			"password-input",
			StepKind::PasswordEntry,
			vec![
				Predicate::url("challenge/pwd"),
				Predicate::selector("input[type='password']"),
			],
			"the password challenge has a stable URL segment and a visible password input",
		),
		Rule::new(
			"account-chooser",
			StepKind::AccountChooser,
			vec![
				Predicate::url("accountchooser"),
				Predicate::selector("[data-identifier]"),
				Predicate::text("choose an account"),
			],
			"the chooser URL segment and the account-row attribute the provider stamps on each entry",
		),
		Rule::new(
			"email-input",
			StepKind::EmailEntry,
			vec![
				Predicate::url_pattern(r"signin(/v2)?/identifier"),
				Predicate::selector("input[type='email']"),
				Predicate::selector("#identifierId"),
				Predicate::selector("input[name='identifier']"),
			],
			"identifier URL (both path versions) and the provider's email field variants",
		),
		Rule::new(
			"two-factor-copy",
			StepKind::TwoFactorChallenge,
			vec![
				Predicate::text("2-step verification"),
				Predicate::text("verification code"),
				Predicate::selector("input[type='tel']"),
			],
			"looser signals: tel inputs also appear on phone-collection pages, so this sits below every concrete rule",
		),
		Rule::new(
			"app-content",
			StepKind::Authenticated,
			vec![
				Predicate::url("/app/"),
				Predicate::url("/prompts/"),
				Predicate::selector("a[href*='/app/']"),
			],
			"post-login URL shapes and navigation only rendered for signed-in users; the validator still has to concur before the loop treats this as terminal",
		),
		Rule::new(
			"signin-cta",
			StepKind::Unauthenticated,
			vec![
				Predicate::selector("[data-value='sign_in']"),
				Predicate::text("get started"),
				Predicate::text("sign in"),
			],
			"the product landing page's sign-in call to action; last because provider pages also say 'sign in'",
		),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_rule_names_a_rationale() {
		for rule in default_rules() {
			assert!(!rule.rationale.is_empty(), "rule {} has no rationale", rule.name);
			assert!(!rule.predicates.is_empty(), "rule {} has no predicates", rule.name);
		}
	}

	#[test]
	fn structural_rules_precede_textual_two_factor() {
		let rules = default_rules();
		let totp = rules.iter().position(|r| r.name == "totp-input").unwrap();
		let copy = rules.iter().position(|r| r.name == "two-factor-copy").unwrap();
		let pwd = rules.iter().position(|r| r.name == "password-input").unwrap();
		assert!(totp < pwd);
		assert!(pwd < copy);
	}
}
