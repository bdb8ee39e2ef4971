//! Bounded wait-and-reclassify.
//!
//! Used for `Unknown` pages (consent interstitials, slow renders) and for
//! `Authenticated` classifications the validator has not confirmed. Both
//! mean "the page has not finished becoming something actionable"; the
//! only correct move is to watch classification, bounded, and let the
//! guard's counters decide when watching has gone on too long.

use async_trait::async_trait;
use tracing::debug;

use super::{settle, Outcome, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

pub struct WaitStep {
	kind: StepKind,
}

impl WaitStep {
	pub fn for_kind(kind: StepKind) -> Self {
		Self { kind }
	}
}

#[async_trait]
impl StepHandler for WaitStep {
	fn kind(&self) -> StepKind {
		self.kind
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		debug!(target = "authflow", kind = %self.kind, "waiting for the page to reclassify");
		settle(cx, self.kind).await
	}
}
