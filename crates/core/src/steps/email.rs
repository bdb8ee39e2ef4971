//! Email (identifier) entry.

use async_trait::async_trait;

use super::{candidate, first_present, settle, submit_or_enter, Outcome, SelectorCandidate, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

pub struct EmailEntryStep;

fn email_fields() -> Vec<SelectorCandidate> {
	vec![
		candidate("input[type='email']", "semantic input type, stable across provider redesigns"),
		candidate("input[name='identifier']", "the provider's form field name"),
		candidate("#identifierId", "legacy id still present on older flow variants"),
		candidate("input[autocomplete='username']", "autocomplete hint, last because other fields may carry it"),
	]
}

fn submit_controls() -> Vec<SelectorCandidate> {
	vec![
		candidate("#identifierNext", "the provider's named next button"),
		candidate("button[type='submit']", "generic submit control"),
	]
}

#[async_trait]
impl StepHandler for EmailEntryStep {
	fn kind(&self) -> StepKind {
		StepKind::EmailEntry
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		let field = match first_present(cx.session, &email_fields()).await {
			Ok(entry) => entry.selector.clone(),
			Err(err) if err.is_transient() => return Ok(Outcome::Unchanged),
			Err(err) => return Err(err),
		};

		// Clear-then-type: overwriting in place mis-fires the provider's
		// "changed" handlers and leaves concatenated identifiers behind.
		if let Err(err) = cx.session.fill_field(&field, &cx.credentials.email).await {
			if !err.is_transient() {
				return Err(err);
			}
			return Ok(Outcome::Unchanged);
		}

		submit_or_enter(cx, &field, &submit_controls()).await?;
		cx.session.capture("after-email-submit").await;
		settle(cx, StepKind::EmailEntry).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn field_table_prefers_semantic_type() {
		let table = email_fields();
		assert_eq!(table[0].selector, "input[type='email']");
		assert!(table.iter().all(|c| !c.rationale.is_empty()));
	}
}
