//! Entry step: the product landing page, logged out.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{candidate, first_present, settle, Outcome, SelectorCandidate, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

/// Starts the ceremony by activating the product's sign-in control, or by
/// navigating straight to the provider's sign-in URL when the landing page
/// exposes none.
pub struct UnauthenticatedStep;

fn signin_controls() -> Vec<SelectorCandidate> {
	vec![
		candidate("[data-value='sign_in']", "the provider-tagged sign-in control, when the product renders one"),
		candidate("text=Sign in", "visible sign-in link, driver text-selector syntax"),
		candidate("text=Get started", "some landing variants label the same entry point 'Get started'"),
	]
}

#[async_trait]
impl StepHandler for UnauthenticatedStep {
	fn kind(&self) -> StepKind {
		StepKind::Unauthenticated
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		cx.session.capture("before-signin").await;

		match first_present(cx.session, &signin_controls()).await {
			Ok(entry) => {
				debug!(target = "authflow", selector = %entry.selector, "activating sign-in control");
				if let Err(err) = cx.session.click(&entry.selector).await {
					if !err.is_transient() {
						return Err(err);
					}
					debug!(target = "authflow", error = %err, "sign-in click did not land, will reclassify");
				}
			}
			Err(err) if err.is_transient() => {
				// No control on the page; go to the provider directly.
				let url = signin_url(cx);
				info!(target = "authflow", url = %url, "no sign-in control found, navigating to provider");
				if let Err(err) = cx.session.goto(&url).await {
					if !err.is_transient() {
						return Err(err);
					}
				}
			}
			Err(err) => return Err(err),
		}

		settle(cx, StepKind::Unauthenticated).await
	}
}

fn signin_url(cx: &StepContext<'_>) -> String {
	cx.config
		.signin_url
		.clone()
		.unwrap_or_else(|| format!("https://{}/signin/v2/identifier", cx.config.provider_host))
}
