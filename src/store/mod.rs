//! Persistent preset store.
//!
//! # Data Flow
//! ```text
//! Handler call
//!     → PresetStore (single SQLite connection behind a mutex)
//!     → transaction: mutate presets + append sync_log entry
//!     → commit (or rollback as a unit)
//! ```
//!
//! # Design Decisions
//! - One connection serialized by a mutex: every operation is atomic
//!   per record and writers never starve readers on this workload
//! - Upsert is a single INSERT with ON CONFLICT arms for the id and
//!   the identity tuple, so identity re-saves never race
//! - Timestamps are RFC3339 text with fixed microsecond precision,
//!   which keeps lexicographic and chronological order identical

pub mod model;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
pub use model::{NewPreset, Preset, ScopeType, SyncAction, SyncLogEntry};
pub use schema::SCHEMA;

const PRESET_COLUMNS: &str = "id, name, scope_type, scope_value, fields, encrypted, \
     created_at, updated_at, last_used_at, use_count, device_id, metadata";

const UPSERT_SQL: &str = "\
INSERT INTO presets \
    (id, name, scope_type, scope_value, fields, encrypted, \
     created_at, updated_at, last_used_at, use_count, device_id, metadata) \
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, NULL, 0, ?8, ?9) \
ON CONFLICT (scope_type, scope_value, name, device_id) DO UPDATE SET \
    fields = excluded.fields, \
    encrypted = excluded.encrypted, \
    updated_at = excluded.updated_at, \
    metadata = excluded.metadata \
ON CONFLICT (id) DO UPDATE SET \
    name = excluded.name, \
    scope_type = excluded.scope_type, \
    scope_value = excluded.scope_value, \
    fields = excluded.fields, \
    encrypted = excluded.encrypted, \
    updated_at = excluded.updated_at, \
    metadata = excluded.metadata \
RETURNING id, name, scope_type, scope_value, fields, encrypted, \
    created_at, updated_at, last_used_at, use_count, device_id, metadata";

fn fmt_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn row_to_preset(row: &Row<'_>) -> rusqlite::Result<Preset> {
    let scope_type: String = row.get(2)?;
    let fields: String = row.get(4)?;
    let last_used_raw: Option<String> = row.get(8)?;
    let metadata_raw: Option<String> = row.get(11)?;

    let last_used_at = match last_used_raw {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| conversion_err(8, e))?,
        ),
        None => None,
    };
    let metadata = match metadata_raw {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| conversion_err(11, e))?),
        None => None,
    };

    Ok(Preset {
        id: row.get(0)?,
        name: row.get(1)?,
        scope_type: scope_type.parse().map_err(|e: String| conversion_err(2, e))?,
        scope_value: row.get(3)?,
        fields: serde_json::from_str(&fields).map_err(|e| conversion_err(4, e))?,
        encrypted: row.get(5)?,
        created_at: ts_col(row, 6)?,
        updated_at: ts_col(row, 7)?,
        last_used_at,
        use_count: row.get(9)?,
        device_id: row.get(10)?,
        metadata,
    })
}

fn row_to_log_entry(row: &Row<'_>) -> rusqlite::Result<SyncLogEntry> {
    let action: String = row.get(2)?;
    Ok(SyncLogEntry {
        seq: row.get(0)?,
        preset_id: row.get(1)?,
        action: action.parse().map_err(|e: String| conversion_err(2, e))?,
        device_id: row.get(3)?,
        created_at: ts_col(row, 4)?,
    })
}

/// Durable store for presets and their sync log.
#[derive(Clone)]
pub struct PresetStore {
    conn: Arc<Mutex<Connection>>,
}

impl PresetStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or update a preset.
    ///
    /// Assigns an identifier when absent. The upsert keys on the id
    /// and on the identity tuple (scope_type, scope_value, name,
    /// device_id), so re-saving the same identity overwrites the prior
    /// record. Appends a `save` sync-log entry in the same transaction.
    ///
    /// Returns the fully populated record and whether it was newly
    /// created (as opposed to overwritten).
    pub fn save(&self, new: NewPreset) -> Result<(Preset, bool)> {
        if new.device_id.trim().is_empty() {
            return Err(ServiceError::Validation("device_id must not be empty".into()));
        }
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }

        let id = new.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = fmt_ts(Utc::now());
        let fields = serde_json::to_string(&new.fields)?;
        let metadata = match &new.metadata {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let preset = tx.query_row(
            UPSERT_SQL,
            params![
                id,
                new.name,
                new.scope_type.as_str(),
                new.scope_value,
                fields,
                new.encrypted,
                now,
                new.device_id,
                metadata,
            ],
            row_to_preset,
        )?;
        tx.execute(
            "INSERT INTO sync_log (preset_id, action, device_id, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![preset.id, SyncAction::Save.as_str(), preset.device_id, now],
        )?;
        tx.commit()?;

        // A freshly inserted row carries identical timestamps; an
        // overwrite moves updated_at past created_at.
        let created = preset.created_at == preset.updated_at;
        Ok((preset, created))
    }

    /// Presets owned by the device, plus unscoped/shared presets,
    /// most recently updated first.
    pub fn get_all(&self, device_id: &str) -> Result<Vec<Preset>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRESET_COLUMNS} FROM presets \
             WHERE device_id = ?1 OR device_id = '' \
             ORDER BY updated_at DESC"
        ))?;
        let presets = stmt.query_map([device_id], row_to_preset)?;
        presets
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ServiceError::from)
    }

    /// Fetch one preset, visible only to its owner or when unscoped.
    pub fn get(&self, id: &str, device_id: &str) -> Result<Option<Preset>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {PRESET_COLUMNS} FROM presets \
                 WHERE id = ?1 AND (device_id = ?2 OR device_id = '')"
            ),
            params![id, device_id],
            row_to_preset,
        )
        .optional()
        .map_err(ServiceError::from)
    }

    /// Exact-match scope lookup, most recently updated first.
    pub fn get_by_scope(&self, scope_type: ScopeType, scope_value: &str) -> Result<Vec<Preset>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRESET_COLUMNS} FROM presets \
             WHERE scope_type = ?1 AND scope_value = ?2 \
             ORDER BY updated_at DESC"
        ))?;
        let presets = stmt.query_map(params![scope_type.as_str(), scope_value], row_to_preset)?;
        presets
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ServiceError::from)
    }

    /// Delete a preset, scoped to its owning device.
    ///
    /// Fails with `NotFound` when the id is absent *or* owned by a
    /// different device; the two cases are indistinguishable. On
    /// success the preset's prior log entries are cascaded away and a
    /// `delete` marker is appended, all in one transaction.
    pub fn delete(&self, id: &str, device_id: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM presets WHERE id = ?1 AND device_id = ?2",
            params![id, device_id],
        )?;
        if removed == 0 {
            return Err(ServiceError::NotFound);
        }
        tx.execute("DELETE FROM sync_log WHERE preset_id = ?1", [id])?;
        tx.execute(
            "INSERT INTO sync_log (preset_id, action, device_id, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![id, SyncAction::Delete.as_str(), device_id, fmt_ts(Utc::now())],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Increment the use counter and stamp last_used_at.
    pub fn record_usage(&self, id: &str) -> Result<()> {
        let now = fmt_ts(Utc::now());
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let owner: Option<String> = tx
            .query_row(
                "UPDATE presets SET use_count = use_count + 1, last_used_at = ?1 \
                 WHERE id = ?2 RETURNING device_id",
                params![now, id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(owner) = owner else {
            return Err(ServiceError::NotFound);
        };
        tx.execute(
            "INSERT INTO sync_log (preset_id, action, device_id, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![id, SyncAction::Use.as_str(), owner, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete presets unused for longer than `days`. A preset that was
    /// never used ages from its creation timestamp. `days == 0` is an
    /// explicit no-op, never a full wipe. Returns the number removed.
    pub fn cleanup_older_than(&self, days: u32) -> Result<usize> {
        if days == 0 {
            return Ok(0);
        }
        let cutoff = fmt_ts(Utc::now() - chrono::Duration::days(i64::from(days)));
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM sync_log WHERE preset_id IN \
             (SELECT id FROM presets WHERE COALESCE(last_used_at, created_at) < ?1)",
            [&cutoff],
        )?;
        let removed = tx.execute(
            "DELETE FROM presets WHERE COALESCE(last_used_at, created_at) < ?1",
            [&cutoff],
        )?;
        tx.commit()?;
        if removed > 0 {
            tracing::info!(removed, days, "Retention cleanup removed stale presets");
        }
        Ok(removed)
    }

    /// Distinct non-empty device identifiers that own at least one preset.
    pub fn list_devices(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT device_id FROM presets \
             WHERE device_id != '' ORDER BY device_id",
        )?;
        let devices = stmt.query_map([], |row| row.get(0))?;
        devices
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ServiceError::from)
    }

    /// Sync-log entries for one preset, newest first.
    pub fn sync_log(&self, preset_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT seq, preset_id, action, device_id, created_at FROM sync_log \
             WHERE preset_id = ?1 ORDER BY seq DESC LIMIT ?2",
        )?;
        let entries = stmt.query_map(params![preset_id, limit as i64], row_to_log_entry)?;
        entries
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ServiceError::from)
    }

    /// Most recent sync-log entries across all presets, newest first.
    pub fn recent_sync_log(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT seq, preset_id, action, device_id, created_at FROM sync_log \
             ORDER BY seq DESC LIMIT ?1",
        )?;
        let entries = stmt.query_map([limit as i64], row_to_log_entry)?;
        entries
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ServiceError::from)
    }

    /// Presets visible to a device (owned + shared), for `/sync/status`.
    pub fn count_for_device(&self, device_id: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM presets WHERE device_id = ?1 OR device_id = ''",
            [device_id],
            |row| row.get(0),
        )
        .map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_preset(name: &str, device: &str) -> NewPreset {
        NewPreset {
            id: None,
            name: name.to_string(),
            scope_type: ScopeType::Domain,
            scope_value: "example.com".to_string(),
            fields: json!({"user": "a"}),
            encrypted: false,
            device_id: device.to_string(),
            metadata: None,
        }
    }

    fn backdate(store: &PresetStore, id: &str, days: i64) {
        let ts = fmt_ts(Utc::now() - chrono::Duration::days(days));
        store
            .conn
            .lock()
            .execute(
                "UPDATE presets SET created_at = ?1, updated_at = ?1, \
                 last_used_at = CASE WHEN last_used_at IS NULL THEN NULL ELSE ?1 END \
                 WHERE id = ?2",
                params![ts, id],
            )
            .unwrap();
    }

    #[test]
    fn save_then_get_all_round_trips() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, created) = store.save(new_preset("Login", "dev1")).unwrap();
        assert!(created);
        assert!(!saved.id.is_empty());

        let all = store.get_all("dev1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, saved.id);
        assert_eq!(all[0].name, "Login");
        assert_eq!(all[0].fields, json!({"user": "a"}));
        assert_eq!(all[0].use_count, 0);
        assert!(all[0].last_used_at.is_none());
    }

    #[test]
    fn identity_resave_overwrites_instead_of_duplicating() {
        let store = PresetStore::in_memory().unwrap();
        let (first, created) = store.save(new_preset("Login", "dev1")).unwrap();
        assert!(created);

        let mut again = new_preset("Login", "dev1");
        again.fields = json!({"user": "b"});
        let (second, created) = store.save(again).unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.fields, json!({"user": "b"}));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);

        assert_eq!(store.get_all("dev1").unwrap().len(), 1);
    }

    #[test]
    fn upsert_by_id_updates_in_place() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, _) = store.save(new_preset("Login", "dev1")).unwrap();

        let mut update = new_preset("Login renamed", "dev1");
        update.id = Some(saved.id.clone());
        let (updated, created) = store.save(update).unwrap();
        assert!(!created);
        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.name, "Login renamed");
        assert_eq!(store.get_all("dev1").unwrap().len(), 1);
    }

    #[test]
    fn empty_name_or_device_is_rejected() {
        let store = PresetStore::in_memory().unwrap();

        let mut no_device = new_preset("Login", "");
        no_device.device_id = String::new();
        assert!(matches!(
            store.save(no_device),
            Err(ServiceError::Validation(_))
        ));

        assert!(matches!(
            store.save(new_preset("", "dev1")),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn shared_presets_are_visible_to_every_device() {
        let store = PresetStore::in_memory().unwrap();
        store.save(new_preset("Mine", "dev1")).unwrap();

        // Shared presets are rows whose device_id is empty; the save
        // contract requires a device, so insert one directly.
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO presets (id, name, scope_type, scope_value, fields, encrypted, \
                 created_at, updated_at, device_id) \
                 VALUES ('shared-1', 'Shared', 'global', '', '{}', 0, ?1, ?1, '')",
                [fmt_ts(Utc::now())],
            )
            .unwrap();

        let dev1 = store.get_all("dev1").unwrap();
        assert_eq!(dev1.len(), 2);
        let dev2 = store.get_all("dev2").unwrap();
        assert_eq!(dev2.len(), 1);
        assert_eq!(dev2[0].id, "shared-1");

        // Shared rows never show up as devices.
        assert_eq!(store.list_devices().unwrap(), vec!["dev1".to_string()]);
    }

    #[test]
    fn scope_lookup_is_exact_match() {
        let store = PresetStore::in_memory().unwrap();
        store.save(new_preset("Login", "dev1")).unwrap();

        let mut other = new_preset("Other", "dev1");
        other.scope_value = "sub.example.com".to_string();
        store.save(other).unwrap();

        let hits = store.get_by_scope(ScopeType::Domain, "example.com").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Login");
        assert!(store
            .get_by_scope(ScopeType::Url, "example.com")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_is_scoped_to_owning_device() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, _) = store.save(new_preset("Login", "dev1")).unwrap();

        // Another device gets the same answer for a wrong id and a
        // foreign id: NotFound, nothing leaked.
        assert!(matches!(
            store.delete(&saved.id, "dev2"),
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            store.delete("no-such-id", "dev2"),
            Err(ServiceError::NotFound)
        ));
        assert_eq!(store.get_all("dev1").unwrap().len(), 1);

        store.delete(&saved.id, "dev1").unwrap();
        assert!(store.get_all("dev1").unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_log_and_appends_marker() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, _) = store.save(new_preset("Login", "dev1")).unwrap();
        store.record_usage(&saved.id).unwrap();
        assert_eq!(store.sync_log(&saved.id, 10).unwrap().len(), 2);

        store.delete(&saved.id, "dev1").unwrap();

        let log = store.sync_log(&saved.id, 10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, SyncAction::Delete);
    }

    #[test]
    fn usage_increments_exactly_n_times() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, _) = store.save(new_preset("Login", "dev1")).unwrap();

        for _ in 0..5 {
            store.record_usage(&saved.id).unwrap();
        }
        let fetched = store.get(&saved.id, "dev1").unwrap().unwrap();
        assert_eq!(fetched.use_count, 5);
        assert!(fetched.last_used_at.is_some());

        assert!(matches!(
            store.record_usage("no-such-id"),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn cleanup_zero_days_is_a_noop() {
        let store = PresetStore::in_memory().unwrap();
        store.save(new_preset("Login", "dev1")).unwrap();
        assert_eq!(store.cleanup_older_than(0).unwrap(), 0);
        assert_eq!(store.get_all("dev1").unwrap().len(), 1);
    }

    #[test]
    fn cleanup_removes_only_stale_presets() {
        let store = PresetStore::in_memory().unwrap();
        let (stale, _) = store.save(new_preset("Old", "dev1")).unwrap();
        let mut fresh = new_preset("New", "dev1");
        fresh.scope_value = "fresh.example.com".to_string();
        store.save(fresh).unwrap();

        backdate(&store, &stale.id, 91);

        assert_eq!(store.cleanup_older_than(90).unwrap(), 1);
        let remaining = store.get_all("dev1").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "New");
        // Cascaded log entries are gone with the preset.
        assert!(store.sync_log(&stale.id, 10).unwrap().is_empty());
    }

    #[test]
    fn cleanup_uses_last_used_over_created() {
        let store = PresetStore::in_memory().unwrap();
        let (preset, _) = store.save(new_preset("Used", "dev1")).unwrap();
        backdate(&store, &preset.id, 120);
        // A recent usage rescues an old preset.
        store.record_usage(&preset.id).unwrap();

        assert_eq!(store.cleanup_older_than(90).unwrap(), 0);
        assert_eq!(store.get_all("dev1").unwrap().len(), 1);
    }

    #[test]
    fn sync_log_is_ordered_newest_first_and_bounded() {
        let store = PresetStore::in_memory().unwrap();
        let (saved, _) = store.save(new_preset("Login", "dev1")).unwrap();
        store.record_usage(&saved.id).unwrap();
        store.record_usage(&saved.id).unwrap();

        let log = store.sync_log(&saved.id, 2).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].seq > log[1].seq);
        assert_eq!(log[0].action, SyncAction::Use);

        let recent = store.recent_sync_log(100).unwrap();
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn count_for_device_includes_shared() {
        let store = PresetStore::in_memory().unwrap();
        store.save(new_preset("Mine", "dev1")).unwrap();
        assert_eq!(store.count_for_device("dev1").unwrap(), 1);
        assert_eq!(store.count_for_device("dev2").unwrap(), 0);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.db");
        {
            let store = PresetStore::open(&path).unwrap();
            store.save(new_preset("Login", "dev1")).unwrap();
        }
        let store = PresetStore::open(&path).unwrap();
        assert_eq!(store.get_all("dev1").unwrap().len(), 1);
    }
}
