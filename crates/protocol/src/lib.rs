//! Serializable data types shared between the login state machine and its
//! external collaborators:
//!
//! * [`record`]: persisted session material (cookies, storage blob, capture metadata)
//! * [`snapshot`]: read-only page evidence consumed by classification

pub mod record;
pub mod snapshot;

pub use record::{CookieEntry, SameSite, SessionRecord};
pub use snapshot::{PageSnapshot, SelectorProbe};
