//! The single entry point: run one login ceremony end to end.
//!
//! Order of operations is the contract here: fingerprint patches go in
//! before any navigation, persisted cookies go in before any navigation,
//! a still-valid persisted session short-circuits the ceremony entirely,
//! and the browser context is released on every exit path, with one
//! deliberate exception for suspended attempts, documented on [`LoginFlow::run`].

use std::path::PathBuf;
use std::sync::Arc;

use authflow_protocol::record::SessionRecord;
use tracing::{debug, info, warn};

use crate::browser::LoginSession;
use crate::classify::{Classifier, StepKind};
use crate::config::LoginConfig;
use crate::credentials::{Credentials, CredentialsProvider};
use crate::diagnostics::{NullSink, ScreenshotSink};
use crate::driver::PageDriver;
use crate::error::{LoginError, Result};
use crate::guard::{self, LoopState, LoopVerdict};
use crate::steps::StepContext;
use crate::store::SessionStore;
use crate::validator::SessionValidator;

/// Terminal result of one login attempt.
#[derive(Debug)]
pub enum LoginResult {
	Success(SessionRecord),
	/// The provider explicitly refused the credentials.
	Rejected(String),
	/// The retry budget ran out before reaching a terminal state: the
	/// automation could not keep up with the page, which is a different
	/// failure from being refused.
	GuardExhausted,
	/// A human has to act; the attempt is suspended and resumable.
	ManualInterventionRequired(HumanPrompt),
}

/// Everything a human needs to resolve a suspended step.
#[derive(Debug, Clone)]
pub struct HumanPrompt {
	pub url: String,
	pub screenshot: Option<PathBuf>,
	pub step: StepKind,
}

/// One configured login ceremony over an injected driver, credential
/// source, and session store.
pub struct LoginFlow {
	driver: Arc<dyn PageDriver>,
	provider: Arc<dyn CredentialsProvider>,
	store: SessionStore,
	config: LoginConfig,
	sink: Arc<dyn ScreenshotSink>,
	classifier: Classifier,
	validator: SessionValidator,
}

impl LoginFlow {
	pub fn new(driver: Arc<dyn PageDriver>, provider: Arc<dyn CredentialsProvider>, store: SessionStore, config: LoginConfig) -> Self {
		Self {
			driver,
			provider,
			store,
			config,
			sink: Arc::new(NullSink),
			classifier: Classifier::default(),
			validator: SessionValidator::default(),
		}
	}

	/// Replaces the diagnostic screenshot sink (default: none).
	pub fn with_sink(mut self, sink: Arc<dyn ScreenshotSink>) -> Self {
		self.sink = sink;
		self
	}

	/// Replaces the classifier rule table.
	pub fn with_classifier(mut self, classifier: Classifier) -> Self {
		self.classifier = classifier;
		self
	}

	/// Replaces the validator indicator table.
	pub fn with_validator(mut self, validator: SessionValidator) -> Self {
		self.validator = validator;
		self
	}

	/// Runs one full login attempt.
	///
	/// The browser context closes on every exit path except
	/// [`LoginResult::ManualInterventionRequired`], which suspends the
	/// attempt so [`resume`](Self::resume) can continue from the current
	/// page once the human has acted; abandon a suspended attempt with
	/// [`close`](Self::close). There is no internal deadline beyond the
	/// guard bounds; callers wanting wall-clock cancellation wrap this in
	/// `tokio::time::timeout`.
	pub async fn run(&self) -> Result<LoginResult> {
		let session = self.session();
		let result = self.run_inner(&session).await;
		self.release_unless_suspended(&session, &result).await;
		result
	}

	/// Re-enters the loop from the current classification, without
	/// navigation or session-store reuse. For continuing after a
	/// [`LoginResult::ManualInterventionRequired`].
	pub async fn resume(&self) -> Result<LoginResult> {
		let session = self.session();
		info!(target = "authflow", "resuming suspended login attempt");
		let credentials = self.fetch_credentials().await?;
		let probes = self.probes();
		let result = self.drive(&session, &probes, &credentials).await;
		self.release_unless_suspended(&session, &result).await;
		result
	}

	/// Releases the browser context of a suspended attempt.
	pub async fn close(&self) -> Result<()> {
		self.session().close().await
	}

	fn session(&self) -> LoginSession {
		LoginSession::new(self.driver.clone(), self.sink.clone(), &self.config)
	}

	/// Union of classifier and validator probe selectors, order-preserving.
	fn probes(&self) -> Vec<String> {
		let mut probes = self.classifier.selectors();
		for selector in self.validator.selectors() {
			if !probes.contains(&selector) {
				probes.push(selector);
			}
		}
		probes
	}

	async fn run_inner(&self, session: &LoginSession) -> Result<LoginResult> {
		// Patches must precede the first request; the provider may
		// fingerprint it.
		session.initialize(&self.config.browser).await?;
		let probes = self.probes();

		let reused = self.store.load();
		if let Some(record) = &reused {
			session.apply_record(record).await?;
		}

		self.navigate_to_entry(session).await?;

		if let Some(record) = reused {
			let snapshot = session.snapshot(&probes).await?;
			if self.validator.is_authenticated(&snapshot) {
				info!(target = "authflow", url = %snapshot.url, "persisted session still valid, login skipped");
				return Ok(LoginResult::Success(record));
			}
			info!(target = "authflow", "persisted session no longer valid, running the full ceremony");
		}

		let credentials = self.fetch_credentials().await?;
		self.drive(session, &probes, &credentials).await
	}

	async fn navigate_to_entry(&self, session: &LoginSession) -> Result<()> {
		match session.goto(&self.config.entry_url).await {
			Ok(()) => Ok(()),
			Err(err) if err.is_transient() => {
				// Slow first paint; classify whatever did load.
				warn!(target = "authflow", url = %self.config.entry_url, error = %err, "entry navigation timed out, continuing");
				Ok(())
			}
			Err(err) => Err(err),
		}
	}

	async fn fetch_credentials(&self) -> Result<Credentials> {
		let hint = self.config.account_hint.as_deref();
		self.provider.credentials(hint).await.ok_or_else(|| LoginError::CredentialsUnavailable {
			hint: self.config.account_hint.clone(),
		})
	}

	async fn drive(&self, session: &LoginSession, probes: &[String], credentials: &Credentials) -> Result<LoginResult> {
		let cx = StepContext {
			session,
			classifier: &self.classifier,
			credentials,
			config: &self.config,
			probes,
		};

		let verdict = guard::drive(&cx, &self.validator, LoopState::new(self.config.limits)).await?;
		match verdict {
			LoopVerdict::Authenticated => {
				let record = session.capture_record().await?;
				self.store.save(&record)?;
				info!(target = "authflow", url = %record.source_url, cookies = record.cookies.len(), "login succeeded");
				Ok(LoginResult::Success(record))
			}
			LoopVerdict::Rejected(message) => Ok(LoginResult::Rejected(message)),
			LoopVerdict::GuardExhausted => Ok(LoginResult::GuardExhausted),
			LoopVerdict::NeedsHuman { url, screenshot, step } => Ok(LoginResult::ManualInterventionRequired(HumanPrompt { url, screenshot, step })),
		}
	}

	async fn release_unless_suspended(&self, session: &LoginSession, result: &Result<LoginResult>) {
		if matches!(result, Ok(LoginResult::ManualInterventionRequired(_))) {
			return;
		}
		if let Err(err) = session.close().await {
			debug!(target = "authflow", error = %err, "browser context close failed");
		}
	}
}

/// Runs one login ceremony. See [`LoginFlow::run`] for lifecycle details.
pub async fn run_login(
	driver: Arc<dyn PageDriver>,
	provider: Arc<dyn CredentialsProvider>,
	store: SessionStore,
	config: LoginConfig,
) -> Result<LoginResult> {
	LoginFlow::new(driver, provider, store, config).run().await
}
