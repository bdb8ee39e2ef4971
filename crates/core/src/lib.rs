//! Bounded state machine for multi-step web login ceremonies.
//!
//! Drives an injected browser [`driver`](crate::driver::PageDriver)
//! through account selection, email entry, password entry, and two-factor
//! challenges against an identity provider whose pages are deliberately
//! unstable. The moving parts:
//!
//! * [`classify`] - ordered first-match rules turning a page snapshot into
//!   one [`classify::StepKind`]
//! * [`steps`] - one handler per step, reporting `Advanced` / `Unchanged` /
//!   `Failed`
//! * [`guard`] - the counter-bounded classify→dispatch loop
//! * [`validator`] - signed-signal "actually authenticated?" verdicts
//! * [`store`] - session persistence with an age policy
//! * [`flow`] - the [`flow::run_login`] process boundary
//!
//! External collaborators stay behind traits: the browser
//! ([`driver::PageDriver`]), credentials
//! ([`credentials::CredentialsProvider`]), and diagnostics
//! ([`diagnostics::ScreenshotSink`]).

pub mod browser;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod flow;
pub mod guard;
pub mod logging;
pub mod steps;
pub mod store;
pub mod validator;

pub use authflow_protocol::record::{CookieEntry, SameSite, SessionRecord};
pub use authflow_protocol::snapshot::{PageSnapshot, SelectorProbe};

pub use crate::classify::{Classification, Classifier, StepKind};
pub use crate::config::{BrowserConfig, GuardLimits, LoginConfig};
pub use crate::credentials::{Credentials, CredentialsProvider, StaticCredentials};
pub use crate::diagnostics::{DriverSink, NullSink, ScreenshotSink};
pub use crate::driver::{DriverError, DriverResult, PageDriver};
pub use crate::error::{LoginError, Result};
pub use crate::flow::{run_login, HumanPrompt, LoginFlow, LoginResult};
pub use crate::guard::LoopState;
pub use crate::steps::{FailReason, Outcome, StepHandler};
pub use crate::store::SessionStore;
pub use crate::validator::{Indicator, Polarity, SessionValidator, Strength};
