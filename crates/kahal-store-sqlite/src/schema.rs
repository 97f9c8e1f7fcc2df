//! SQL schema for the Kahal SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `user_version` pragma.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id         TEXT PRIMARY KEY,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    father_name       TEXT,            -- patronymic
    birth_date        TEXT,            -- ISO 8601 calendar date
    hebrew_birth_date TEXT,            -- derived label, e.g. '20 Tevet 5784'
    age               INTEGER,         -- derived from birth_date
    sex               TEXT,            -- 'male' | 'female'
    mobile_number     TEXT,
    email             TEXT,
    address           TEXT,            -- JSON Address
    religious_info    TEXT,            -- JSON ReligiousInfo
    notes             TEXT
);

-- Reference catalog of relation kinds; seeded with INSERT OR IGNORE so
-- manual edits to existing rows are never overwritten.
CREATE TABLE IF NOT EXISTS relation_types (
    symbol          TEXT PRIMARY KEY,
    name_ru         TEXT NOT NULL,
    name_he         TEXT NOT NULL,
    reciprocal      TEXT,
    gender_specific INTEGER NOT NULL DEFAULT 0
);

-- A directed edge from an owning person to either a registered person or
-- an inline external relative. Exactly one of the two targets is set.
CREATE TABLE IF NOT EXISTS relations (
    relation_id       TEXT PRIMARY KEY,
    owner_id          TEXT NOT NULL REFERENCES persons(person_id),
    related_person_id TEXT REFERENCES persons(person_id),
    external_info     TEXT,            -- JSON ExternalPersonInfo
    relation_type     TEXT NOT NULL,
    notes             TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    CHECK ((related_person_id IS NULL) != (external_info IS NULL))
);

-- No foreign key on person_id: notifications outlive the person record.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    person_id       TEXT NOT NULL,
    message         TEXT NOT NULL,
    kind            TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'unread',
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS relations_owner_idx   ON relations(owner_id);
CREATE INDEX IF NOT EXISTS relations_related_idx ON relations(related_person_id);
CREATE INDEX IF NOT EXISTS relations_type_idx    ON relations(relation_type);

PRAGMA user_version = 1;
";
