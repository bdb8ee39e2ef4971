//! Step handlers: one per ceremony step.
//!
//! Handlers share one contract: inspect the page through the session,
//! perform the step's action, then report how the ceremony moved.
//! Anything transient (missing element, timeout) becomes
//! [`Outcome::Unchanged`] at the handler boundary: re-classification is
//! the recovery mechanism, and the loop guard's counters bound how often
//! it runs. Nothing escapes a handler as an untyped error.

mod account_chooser;
mod email;
mod password;
mod two_factor;
mod unauthenticated;
mod wait;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

pub use account_chooser::AccountChooserStep;
pub use email::EmailEntryStep;
pub use password::PasswordEntryStep;
pub use two_factor::TwoFactorStep;
pub use unauthenticated::UnauthenticatedStep;
pub use wait::WaitStep;

use crate::browser::LoginSession;
use crate::classify::{Classifier, StepKind};
use crate::config::LoginConfig;
use crate::credentials::Credentials;
use crate::error::{LoginError, Result};

/// How a handler's action moved the ceremony.
#[derive(Debug, Clone)]
pub enum Outcome {
	/// The page classified differently after the action.
	Advanced,
	/// Same classification as before; counted against the step's budget.
	Unchanged,
	/// Terminal for the whole attempt.
	Failed(FailReason),
}

#[derive(Debug, Clone)]
pub enum FailReason {
	/// The provider explicitly refused the credentials. Not retried.
	Rejected(String),
	/// A challenge only a human can answer. A designed suspension point,
	/// not an error: the attempt can resume once the human acts.
	ChallengeRequiresHuman { url: String, screenshot: Option<PathBuf> },
}

/// Everything a handler may touch while acting.
pub struct StepContext<'a> {
	pub session: &'a LoginSession,
	pub classifier: &'a Classifier,
	pub credentials: &'a Credentials,
	pub config: &'a LoginConfig,
	/// Union of every selector classification and validation probe.
	pub probes: &'a [String],
}

impl StepContext<'_> {
	pub(crate) async fn classify_now(&self) -> Result<StepKind> {
		let snapshot = self.session.snapshot(self.probes).await?;
		Ok(self.classifier.classify(&snapshot).kind)
	}
}

#[async_trait]
pub trait StepHandler: Send + Sync {
	fn kind(&self) -> StepKind;

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome>;
}

/// Dispatches one classified step to its handler.
pub(crate) async fn dispatch(kind: StepKind, cx: &StepContext<'_>) -> Result<Outcome> {
	match kind {
		StepKind::Unauthenticated => UnauthenticatedStep.handle(cx).await,
		StepKind::AccountChooser => AccountChooserStep.handle(cx).await,
		StepKind::EmailEntry => EmailEntryStep.handle(cx).await,
		StepKind::PasswordEntry => PasswordEntryStep.handle(cx).await,
		StepKind::TwoFactorChallenge => TwoFactorStep.handle(cx).await,
		// Unknown pages get a bounded wait-and-reclassify; so does an
		// Authenticated classification the validator has not confirmed.
		StepKind::Unknown | StepKind::Authenticated => WaitStep::for_kind(kind).handle(cx).await,
	}
}

/// One entry in a handler's ordered selector table.
#[derive(Debug, Clone)]
pub struct SelectorCandidate {
	pub selector: String,
	/// Why this candidate exists and why it sits at this position.
	pub rationale: &'static str,
}

pub(crate) fn candidate(selector: impl Into<String>, rationale: &'static str) -> SelectorCandidate {
	SelectorCandidate {
		selector: selector.into(),
		rationale,
	}
}

/// Scans an ordered selector table and returns the first visible entry.
///
/// All entries absent is a typed [`LoginError::ElementNotFound`] naming
/// the whole table, transient at the handler boundary and never silently
/// swallowed.
pub(crate) async fn first_present<'t>(session: &LoginSession, table: &'t [SelectorCandidate]) -> Result<&'t SelectorCandidate> {
	for entry in table {
		if session.is_visible(&entry.selector).await? {
			return Ok(entry);
		}
	}
	Err(LoginError::ElementNotFound {
		selector: table.iter().map(|c| c.selector.as_str()).collect::<Vec<_>>().join(", "),
	})
}

/// Activates the first present submit control, falling back to a keyboard
/// Enter on the field when no control is found or the click fails
/// transiently.
pub(crate) async fn submit_or_enter(cx: &StepContext<'_>, field: &str, controls: &[SelectorCandidate]) -> Result<()> {
	match first_present(cx.session, controls).await {
		Ok(entry) => match cx.session.click(&entry.selector).await {
			Ok(()) => Ok(()),
			Err(err) if err.is_transient() => press_enter(cx, field).await,
			Err(err) => Err(err),
		},
		Err(err) if err.is_transient() => press_enter(cx, field).await,
		Err(err) => Err(err),
	}
}

async fn press_enter(cx: &StepContext<'_>, field: &str) -> Result<()> {
	match cx.session.press(field, "Enter").await {
		Ok(()) => Ok(()),
		Err(err) if err.is_transient() => Ok(()),
		Err(err) => Err(err),
	}
}

/// Classify-and-poll until the page stops classifying as `own_kind`.
///
/// Replaces every fixed post-action sleep the problem invites: the next
/// state cannot be predicted from elapsed time, only observed. Bounded by
/// the step timeout; expiry is `Unchanged`, not failure.
pub(crate) async fn settle(cx: &StepContext<'_>, own_kind: StepKind) -> Result<Outcome> {
	settle_within(cx, own_kind, cx.config.step_timeout()).await
}

pub(crate) async fn settle_within(cx: &StepContext<'_>, own_kind: StepKind, budget: Duration) -> Result<Outcome> {
	let deadline = Instant::now() + budget;
	loop {
		tokio::time::sleep(cx.config.poll_interval()).await;
		if cx.classify_now().await? != own_kind {
			return Ok(Outcome::Advanced);
		}
		if Instant::now() >= deadline {
			return Ok(Outcome::Unchanged);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn candidate_tables_keep_order_and_rationale() {
		let table = vec![
			candidate("input[type='email']", "primary"),
			candidate("#identifierId", "provider id"),
		];
		assert_eq!(table[0].selector, "input[type='email']");
		assert_eq!(table[1].rationale, "provider id");
	}
}
