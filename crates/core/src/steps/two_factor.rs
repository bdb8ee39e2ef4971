//! Two-factor challenge.
//!
//! Two shapes exist. A numeric-code prompt needs a human: the handler
//! captures the evidence and suspends the attempt; it never guesses or
//! brute-forces codes. A push-style prompt resolves out-of-band on the
//! user's second device, so the handler just polls classification until
//! the page moves or the wait budget runs out.

use async_trait::async_trait;
use tracing::info;

use super::{candidate, first_present, settle_within, FailReason, Outcome, SelectorCandidate, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

pub struct TwoFactorStep;

fn code_fields() -> Vec<SelectorCandidate> {
	vec![
		candidate("input[name='totpPin']", "the provider's authenticator-code field"),
		candidate("input[autocomplete='one-time-code']", "standard one-time-code autocomplete hint"),
		candidate("input[inputmode='numeric']", "numeric input mode used by newer challenge variants"),
		candidate("input[type='tel']", "oldest variant renders the code field as a tel input; last, since tel also means phone collection"),
	]
}

#[async_trait]
impl StepHandler for TwoFactorStep {
	fn kind(&self) -> StepKind {
		StepKind::TwoFactorChallenge
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		match first_present(cx.session, &code_fields()).await {
			Ok(entry) => {
				let url = cx.session.current_url().await?;
				let screenshot = cx.session.capture("two-factor-code-prompt").await;
				info!(target = "authflow", url = %url, field = %entry.selector, "code challenge requires a human");
				Ok(Outcome::Failed(FailReason::ChallengeRequiresHuman { url, screenshot }))
			}
			Err(err) if err.is_transient() => {
				// Push-style approval: nothing to type here, the resolution
				// happens on the second device.
				info!(target = "authflow", wait_ms = cx.config.two_factor_wait_ms, "waiting for out-of-band approval");
				let outcome = settle_within(cx, StepKind::TwoFactorChallenge, cx.config.two_factor_wait()).await?;
				if matches!(outcome, Outcome::Advanced) {
					cx.session.capture("after-two-factor-approval").await;
				}
				Ok(outcome)
			}
			Err(err) => Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn code_field_table_orders_specific_before_ambiguous() {
		let table = code_fields();
		assert_eq!(table[0].selector, "input[name='totpPin']");
		assert_eq!(table.last().unwrap().selector, "input[type='tel']");
	}
}
