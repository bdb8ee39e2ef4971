//! The classify→dispatch loop and its retry bounds.
//!
//! Termination is a counter property, nothing else: every iteration either
//! ends the attempt or advances `iteration`, and a step that keeps
//! classifying the same way runs out of its per-step budget. Handlers
//! never call themselves or each other; recursion depth is not a retry
//! counter here.

use std::collections::HashMap;
use std::path::PathBuf;

use authflow_protocol::snapshot::PageSnapshot;
use tracing::{info, warn};

use crate::classify::StepKind;
use crate::config::GuardLimits;
use crate::error::Result;
use crate::steps::{self, FailReason, Outcome, StepContext};
use crate::validator::SessionValidator;

/// Counter state for one login attempt. Owned exclusively by the loop;
/// dropped when the loop returns.
#[derive(Debug)]
pub struct LoopState {
	iteration: u32,
	per_step_attempts: HashMap<StepKind, u32>,
	limits: GuardLimits,
}

impl LoopState {
	pub fn new(limits: GuardLimits) -> Self {
		Self {
			iteration: 0,
			per_step_attempts: HashMap::new(),
			limits,
		}
	}

	pub fn iteration(&self) -> u32 {
		self.iteration
	}

	pub fn attempts(&self, kind: StepKind) -> u32 {
		self.per_step_attempts.get(&kind).copied().unwrap_or(0)
	}

	/// True when either bound forbids dispatching `kind` again.
	pub fn exhausted(&self, kind: StepKind) -> bool {
		self.iteration >= self.limits.max_iterations || self.attempts(kind) >= self.limits.max_attempts_per_step
	}

	pub fn advance_iteration(&mut self) {
		self.iteration += 1;
	}

	/// Applies one outcome: `Unchanged` charges the step's budget, while
	/// `Advanced` clears every counter: a forward transition is evidence
	/// the ceremony is progressing normally.
	pub fn record(&mut self, kind: StepKind, outcome: &Outcome) {
		match outcome {
			Outcome::Unchanged => {
				*self.per_step_attempts.entry(kind).or_insert(0) += 1;
			}
			Outcome::Advanced => {
				self.per_step_attempts.clear();
			}
			Outcome::Failed(_) => {}
		}
	}
}

/// Terminal verdict of one driven loop.
#[derive(Debug)]
pub(crate) enum LoopVerdict {
	Authenticated,
	Rejected(String),
	GuardExhausted,
	NeedsHuman {
		url: String,
		screenshot: Option<PathBuf>,
		step: StepKind,
	},
}

/// Drives classify→dispatch until a terminal verdict.
///
/// `Authenticated` is terminal only when the validator concurs with the
/// classifier; a URL that merely looks signed-in goes through the bounded
/// wait step like any other ambiguous page.
pub(crate) async fn drive(cx: &StepContext<'_>, validator: &SessionValidator, mut state: LoopState) -> Result<LoopVerdict> {
	loop {
		let snapshot: PageSnapshot = cx.session.snapshot(cx.probes).await?;
		let classification = cx.classifier.classify(&snapshot);
		info!(
			target = "authflow",
			step = %classification.kind,
			url = %classification.url,
			signals = classification.matched_count(),
			iteration = state.iteration(),
			attempts = state.attempts(classification.kind),
			"classified page"
		);

		if classification.kind == StepKind::Authenticated && validator.is_authenticated(&snapshot) {
			return Ok(LoopVerdict::Authenticated);
		}

		if state.exhausted(classification.kind) {
			warn!(
				target = "authflow",
				step = %classification.kind,
				iteration = state.iteration(),
				attempts = state.attempts(classification.kind),
				"retry budget exhausted"
			);
			return Ok(LoopVerdict::GuardExhausted);
		}

		match steps::dispatch(classification.kind, cx).await? {
			Outcome::Failed(FailReason::Rejected(message)) => return Ok(LoopVerdict::Rejected(message)),
			Outcome::Failed(FailReason::ChallengeRequiresHuman { url, screenshot }) => {
				return Ok(LoopVerdict::NeedsHuman {
					url,
					screenshot,
					step: classification.kind,
				});
			}
			outcome => {
				state.record(classification.kind, &outcome);
				state.advance_iteration();
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn limits(max_iterations: u32, max_attempts_per_step: u32) -> GuardLimits {
		GuardLimits {
			max_iterations,
			max_attempts_per_step,
		}
	}

	#[test]
	fn per_step_budget_exhausts_after_exactly_three_attempts() {
		// A classifier stuck on PasswordEntry gets exactly three dispatches.
		let mut state = LoopState::new(limits(100, 3));
		let mut dispatches = 0;

		while !state.exhausted(StepKind::PasswordEntry) {
			dispatches += 1;
			state.record(StepKind::PasswordEntry, &Outcome::Unchanged);
			state.advance_iteration();
		}

		assert_eq!(dispatches, 3);
		assert_eq!(state.attempts(StepKind::PasswordEntry), 3);
	}

	#[test]
	fn advancing_resets_every_step_budget() {
		let mut state = LoopState::new(limits(100, 2));
		state.record(StepKind::EmailEntry, &Outcome::Unchanged);
		state.record(StepKind::AccountChooser, &Outcome::Unchanged);
		assert_eq!(state.attempts(StepKind::EmailEntry), 1);

		state.record(StepKind::EmailEntry, &Outcome::Advanced);
		assert_eq!(state.attempts(StepKind::EmailEntry), 0);
		assert_eq!(state.attempts(StepKind::AccountChooser), 0);
	}

	#[test]
	fn iteration_bound_terminates_even_when_every_step_advances() {
		// Advancing forever (a ping-ponging flow) still terminates: the
		// total iteration bound does not reset.
		let mut state = LoopState::new(limits(15, 3));
		let mut iterations = 0;

		while !state.exhausted(StepKind::EmailEntry) {
			iterations += 1;
			state.record(StepKind::EmailEntry, &Outcome::Advanced);
			state.advance_iteration();
		}

		assert_eq!(iterations, 15);
	}

	#[test]
	fn failed_outcomes_charge_no_budget() {
		let mut state = LoopState::new(limits(10, 3));
		state.record(
			StepKind::PasswordEntry,
			&Outcome::Failed(FailReason::Rejected("wrong password".into())),
		);
		assert_eq!(state.attempts(StepKind::PasswordEntry), 0);
	}
}
