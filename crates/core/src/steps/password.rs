//! Password entry.
//!
//! The state after a password submit is genuinely unpredictable: success,
//! an explicit rejection, or a two-factor challenge, and elapsed time says
//! nothing about which. The handler therefore settles by re-classifying
//! immediately and scans the settled page for the provider's rejection
//! copy. An explicit refusal is terminal, never retried with the same
//! credentials.

use async_trait::async_trait;
use authflow_protocol::snapshot::PageSnapshot;
use tracing::info;

use super::{candidate, first_present, settle, submit_or_enter, FailReason, Outcome, SelectorCandidate, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

pub struct PasswordEntryStep;

fn password_fields() -> Vec<SelectorCandidate> {
	vec![
		candidate("input[type='password']", "semantic input type, stable across provider redesigns"),
		candidate("input[name='password']", "the provider's form field name"),
		candidate("input[autocomplete='current-password']", "autocomplete hint fallback"),
	]
}

fn submit_controls() -> Vec<SelectorCandidate> {
	vec![
		candidate("#passwordNext", "the provider's named next button"),
		candidate("button[type='submit']", "generic submit control"),
	]
}

/// Provider copy that means the credentials were explicitly refused.
const REJECTION_COPY: &[&str] = &[
	"wrong password",
	"couldn't find your google account",
	"account has been locked",
	"account was disabled",
	"try again later",
];

pub(crate) fn rejection_reason(snapshot: &PageSnapshot) -> Option<String> {
	REJECTION_COPY.iter().find(|needle| snapshot.text_contains(needle)).map(|needle| needle.to_string())
}

#[async_trait]
impl StepHandler for PasswordEntryStep {
	fn kind(&self) -> StepKind {
		StepKind::PasswordEntry
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		let field = match first_present(cx.session, &password_fields()).await {
			Ok(entry) => entry.selector.clone(),
			Err(err) if err.is_transient() => return Ok(Outcome::Unchanged),
			Err(err) => return Err(err),
		};

		// Same clear-then-type discipline as email entry.
		if let Err(err) = cx.session.fill_field(&field, &cx.credentials.password).await {
			if !err.is_transient() {
				return Err(err);
			}
			return Ok(Outcome::Unchanged);
		}

		cx.session.capture("before-password-submit").await;
		submit_or_enter(cx, &field, &submit_controls()).await?;

		let outcome = settle(cx, StepKind::PasswordEntry).await?;

		let snapshot = cx.session.snapshot(cx.probes).await?;
		if let Some(reason) = rejection_reason(&snapshot) {
			info!(target = "authflow", url = %snapshot.url, reason = %reason, "provider rejected credentials");
			cx.session.capture("password-rejected").await;
			return Ok(Outcome::Failed(FailReason::Rejected(reason)));
		}

		Ok(outcome)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejection_copy_is_detected_case_insensitively() {
		let snapshot = PageSnapshot::new(
			"https://accounts.google.com/v3/signin/challenge/pwd",
			"Wrong password. Try again or click Forgot password",
		);
		assert_eq!(rejection_reason(&snapshot), Some("wrong password".to_string()));
	}

	#[test]
	fn ordinary_copy_is_not_a_rejection() {
		let snapshot = PageSnapshot::new("https://accounts.google.com/v3/signin/challenge/pwd", "Enter your password");
		assert_eq!(rejection_reason(&snapshot), None);
	}
}
