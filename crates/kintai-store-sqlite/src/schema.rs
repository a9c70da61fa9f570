//! SQL schema for the Kintai SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; future migrations will be gated on that number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Rules are immutable once written.
CREATE TABLE IF NOT EXISTS rules (
    rule_id       TEXT PRIMARY KEY,
    employee_id   TEXT NOT NULL,
    employee_name TEXT,
    weekdays      TEXT NOT NULL,   -- JSON array of 0..=6, Sunday = 0
    start_date    TEXT NOT NULL,   -- YYYY-MM-DD
    end_date      TEXT NOT NULL,   -- YYYY-MM-DD, inclusive
    hours         REAL NOT NULL,
    kind          TEXT NOT NULL,
    note          TEXT,
    created_at    TEXT NOT NULL
);

-- (employee_id, date, kind) is not UNIQUE: manual entries may
-- repeat a key, only rule expansion avoids duplicates.
-- source_rule_id is a plain lookup column, not a foreign key; deleting a rule
-- leaves its records in place.
CREATE TABLE IF NOT EXISTS records (
    record_id      TEXT PRIMARY KEY,
    employee_id    TEXT NOT NULL,
    employee_name  TEXT,
    date           TEXT NOT NULL,  -- YYYY-MM-DD
    start          TEXT,
    hours          REAL NOT NULL,
    kind           TEXT NOT NULL,
    note           TEXT,
    via_rule       INTEGER NOT NULL DEFAULT 0,
    source_rule_id TEXT,
    created_at     TEXT NOT NULL,  -- RFC 3339 UTC; server-assigned
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_key_idx  ON records(employee_id, date, kind);
CREATE INDEX IF NOT EXISTS records_date_idx ON records(date);
CREATE INDEX IF NOT EXISTS records_rule_idx ON records(source_rule_id);

PRAGMA user_version = 1;
";
