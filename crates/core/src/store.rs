//! File persistence for session records.
//!
//! One pretty-printed JSON file per store. Load is all-or-nothing: a
//! missing, unreadable, malformed, or aged-out record is reported as
//! `None` and never partially applied. File handles are scoped to each
//! call; nothing is held across loop iterations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use authflow_protocol::record::SessionRecord;
use tracing::{debug, info};

use crate::error::Result;

pub struct SessionStore {
	path: PathBuf,
	max_age: Duration,
}

impl SessionStore {
	pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
		Self {
			path: path.into(),
			max_age,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the persisted record, if one exists and is within the age
	/// bound. Unreadable or malformed files are treated as absent, not as
	/// errors; a fresh login simply replaces them.
	pub fn load(&self) -> Option<SessionRecord> {
		let content = fs::read_to_string(&self.path).ok()?;
		let record: SessionRecord = match serde_json::from_str(&content) {
			Ok(record) => record,
			Err(err) => {
				debug!(target = "authflow", path = %self.path.display(), error = %err, "session file unreadable, ignoring");
				return None;
			}
		};

		let now = now_ts();
		if record.is_expired(now, self.max_age.as_secs()) {
			info!(
				target = "authflow",
				path = %self.path.display(),
				age_hours = record.age_secs(now) / 3600,
				"session record past max age, ignoring"
			);
			return None;
		}

		Some(record)
	}

	/// Persists a record, creating parent directories as needed. The file
	/// carries cookies, so on unix it is restricted to the owner.
	pub fn save(&self, record: &SessionRecord) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		fs::write(&self.path, serde_json::to_string_pretty(record)?)?;

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
		}

		info!(target = "authflow", path = %self.path.display(), cookies = record.cookies.len(), "session record saved");
		Ok(())
	}

	/// Removes the persisted record. Missing files are fine.
	pub fn clear(&self) -> Result<()> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}

pub(crate) fn now_ts() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

#[cfg(test)]
mod tests {
	use authflow_protocol::record::CookieEntry;
	use tempfile::TempDir;

	use super::*;

	fn record_captured_at(captured_at: u64) -> SessionRecord {
		SessionRecord::new(
			vec![CookieEntry::new("sid", "token", ".example.com")],
			serde_json::json!({ "origins": [] }),
			captured_at,
			"https://example.com/app/",
		)
	}

	#[test]
	fn save_then_load_round_trips() {
		let tmp = TempDir::new().unwrap();
		let store = SessionStore::new(tmp.path().join("session.json"), Duration::from_secs(24 * 3600));

		let record = record_captured_at(now_ts());
		store.save(&record).unwrap();

		let loaded = store.load().expect("fresh record should load");
		assert_eq!(loaded.cookies, record.cookies);
		assert_eq!(loaded.storage_state, record.storage_state);
		assert_eq!(loaded.source_url, record.source_url);
	}

	#[test]
	fn aged_out_record_loads_as_none() {
		let tmp = TempDir::new().unwrap();
		let store = SessionStore::new(tmp.path().join("session.json"), Duration::from_secs(24 * 3600));

		// Captured 30 hours ago against a 24 hour bound.
		let record = record_captured_at(now_ts() - 30 * 3600);
		store.save(&record).unwrap();

		assert!(store.load().is_none());
	}

	#[test]
	fn missing_and_malformed_files_load_as_none() {
		let tmp = TempDir::new().unwrap();
		let store = SessionStore::new(tmp.path().join("session.json"), Duration::from_secs(3600));

		assert!(store.load().is_none());

		fs::write(store.path(), "{ not json").unwrap();
		assert!(store.load().is_none());
	}

	#[test]
	fn clear_is_idempotent() {
		let tmp = TempDir::new().unwrap();
		let store = SessionStore::new(tmp.path().join("session.json"), Duration::from_secs(3600));

		store.clear().unwrap();
		store.save(&record_captured_at(now_ts())).unwrap();
		store.clear().unwrap();
		assert!(store.load().is_none());
	}

	#[cfg(unix)]
	#[test]
	fn saved_file_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let tmp = TempDir::new().unwrap();
		let store = SessionStore::new(tmp.path().join("session.json"), Duration::from_secs(3600));
		store.save(&record_captured_at(now_ts())).unwrap();

		let mode = fs::metadata(store.path()).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}
}
