//! Database schema and migrations for GradeTrack.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - users table
    r#"
-- Users table for authentication and account management.
-- username and email are NOT unique at the schema level: a soft-deleted
-- account keeps both while a new active account may register them.
-- Uniqueness among active accounts is enforced by the repository.
CREATE TABLE users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    username       TEXT NOT NULL,
    email          TEXT NOT NULL,
    password       TEXT NOT NULL,           -- Argon2 hash
    email_verified INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL DEFAULT (datetime('now')),
    deleted_at     TEXT                     -- soft delete marker
);

CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_username ON users(username);
"#,
    // v2: Sessions table
    r#"
-- Active login sessions; deleted wholesale when the account changes.
CREATE TABLE sessions (
    token      TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL
);

CREATE INDEX idx_sessions_user_id ON sessions(user_id);
"#,
    // v3: Verification tokens table
    r#"
-- Single-use security tokens for email verification, password reset,
-- and email change. Rows are deleted on consumption.
CREATE TABLE verification_tokens (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    token      TEXT NOT NULL UNIQUE,
    purpose    TEXT NOT NULL,               -- 'email_verify', 'password_reset', 'email_change'
    user_id    INTEGER REFERENCES users(id) ON DELETE CASCADE,
    email      TEXT NOT NULL,
    new_email  TEXT,                        -- payload for email_change
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL
);

CREATE INDEX idx_verification_tokens_token ON verification_tokens(token);
CREATE INDEX idx_verification_tokens_subject ON verification_tokens(email, purpose);
"#,
];
