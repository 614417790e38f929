//! SQLite schema for the preset store.

/// Schema applied on every open. All statements are idempotent.
///
/// The unique index on (scope_type, scope_value, name, device_id) is
/// the identity constraint: re-saving the same identity upserts into
/// the existing row instead of accumulating duplicates.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS presets (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    scope_type   TEXT NOT NULL,
    scope_value  TEXT NOT NULL,
    fields       TEXT NOT NULL,
    encrypted    INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    last_used_at TEXT,
    use_count    INTEGER NOT NULL DEFAULT 0,
    device_id    TEXT NOT NULL DEFAULT '',
    metadata     TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_presets_identity
    ON presets (scope_type, scope_value, name, device_id);

CREATE INDEX IF NOT EXISTS idx_presets_scope
    ON presets (scope_type, scope_value);

CREATE INDEX IF NOT EXISTS idx_presets_device
    ON presets (device_id);

CREATE TABLE IF NOT EXISTS sync_log (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    preset_id  TEXT NOT NULL,
    action     TEXT NOT NULL,
    device_id  TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sync_log_preset
    ON sync_log (preset_id);
"#;
