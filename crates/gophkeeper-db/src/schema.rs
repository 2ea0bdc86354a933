//! Logical schema, expressed as SQLite DDL (INTEGER PRIMARY KEY
//! AUTOINCREMENT in place of a serial type). `mac` on `blobs` carries the
//! integrity tag alongside the encrypted blob's salt and IV.

pub const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    owner    TEXT NOT NULL,
    type     INTEGER NOT NULL,
    meta     TEXT NOT NULL,
    resource INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS resources_owner_idx ON resources(owner);

CREATE TABLE IF NOT EXISTS pieces (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    content BLOB NOT NULL,
    salt    BLOB NOT NULL,
    iv      BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS blobs (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    salt     BLOB NOT NULL,
    iv       BLOB NOT NULL,
    mac      BLOB NOT NULL
);
"#;
