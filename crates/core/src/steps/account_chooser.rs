//! Account selection on the provider's chooser page.
//!
//! The chooser is the step the provider quietly breaks: its rows swallow
//! synthetic clicks unless the element holds real focus first. Activation
//! therefore falls through a ladder of strategies (focused click, focused
//! Enter, then a script walk to the nearest clickable ancestor) and
//! treats "the page did not move" as the only failure signal.

use async_trait::async_trait;
use tracing::debug;

use super::{candidate, first_present, Outcome, SelectorCandidate, StepContext, StepHandler};
use crate::classify::StepKind;
use crate::error::Result;

pub struct AccountChooserStep;

fn account_rows(email: &str, local_part: &str) -> Vec<SelectorCandidate> {
	vec![
		candidate(
			format!("[data-identifier='{email}']"),
			"exact email match on the row attribute the provider stamps per account",
		),
		candidate(
			format!("[data-identifier*='{local_part}']"),
			"partial local-part match for rows that elide the domain",
		),
		candidate("[data-identifier]", "any account row; single-account choosers render exactly one"),
	]
}

#[async_trait]
impl StepHandler for AccountChooserStep {
	fn kind(&self) -> StepKind {
		StepKind::AccountChooser
	}

	async fn handle(&self, cx: &StepContext<'_>) -> Result<Outcome> {
		let table = account_rows(&cx.credentials.email, cx.credentials.local_part());
		let row = match first_present(cx.session, &table).await {
			Ok(entry) => entry.selector.clone(),
			Err(err) if err.is_transient() => {
				debug!(target = "authflow", "no account row visible yet, will reclassify");
				return Ok(Outcome::Unchanged);
			}
			Err(err) => return Err(err),
		};

		cx.session.capture("before-account-activation").await;

		for strategy in [Activation::FocusClick, Activation::FocusEnter, Activation::AncestorClick] {
			debug!(target = "authflow", row = %row, strategy = ?strategy, "activating account row");
			if let Err(err) = activate(cx, &row, strategy).await {
				if !err.is_transient() {
					return Err(err);
				}
				continue;
			}

			// One poll per strategy; the full settle budget is not spent
			// until the last strategy has fired.
			tokio::time::sleep(cx.config.poll_interval()).await;
			if cx.classify_now().await? != StepKind::AccountChooser {
				cx.session.capture("after-account-activation").await;
				return Ok(Outcome::Advanced);
			}
		}

		debug!(target = "authflow", "account row activation did not move the page");
		Ok(Outcome::Unchanged)
	}
}

#[derive(Debug, Clone, Copy)]
enum Activation {
	FocusClick,
	FocusEnter,
	AncestorClick,
}

async fn activate(cx: &StepContext<'_>, row: &str, strategy: Activation) -> Result<()> {
	match strategy {
		Activation::FocusClick => {
			cx.session.focus(row).await?;
			cx.session.click(row).await
		}
		Activation::FocusEnter => {
			cx.session.focus(row).await?;
			cx.session.press(row, "Enter").await
		}
		Activation::AncestorClick => {
			cx.session.eval(&ancestor_click_script(&cx.credentials.email)).await?;
			Ok(())
		}
	}
}

/// Finds the element rendering the account email and clicks the nearest
/// ancestor that is actually wired for activation.
fn ancestor_click_script(email: &str) -> String {
	format!(
		r#"(() => {{
	const needle = '{email}';
	const nodes = Array.from(document.querySelectorAll('*'));
	const target = nodes.find(el => el.textContent && el.textContent.includes(needle));
	if (!target) return 'not-found';
	let node = target;
	while (node) {{
		const style = window.getComputedStyle(node);
		if (style.cursor === 'pointer' || node.tagName === 'BUTTON' || node.tagName === 'A' ||
			node.onclick || node.getAttribute('role') === 'button' || node.getAttribute('role') === 'link') {{
			node.click();
			return 'clicked';
		}}
		node = node.parentElement;
	}}
	return 'no-clickable-ancestor';
}})()"#
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn row_table_orders_exact_before_partial_before_generic() {
		let table = account_rows("user@example.com", "user");
		assert_eq!(table[0].selector, "[data-identifier='user@example.com']");
		assert_eq!(table[1].selector, "[data-identifier*='user']");
		assert_eq!(table[2].selector, "[data-identifier]");
	}

	#[test]
	fn ancestor_script_embeds_the_email() {
		let script = ancestor_click_script("user@example.com");
		assert!(script.contains("'user@example.com'"));
		assert!(script.contains("parentElement"));
	}
}
