//! Database schema and migrations for Zephyr.
//!
//! Migrations are applied in order; the schema_version table records which
//! ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users and refresh tokens
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    nickname    TEXT NOT NULL,
    email       TEXT,
    role        TEXT NOT NULL DEFAULT 'member',  -- 'member', 'admin'
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    last_login  TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_users_role ON users(role);

CREATE TABLE refresh_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    revoked_at  TEXT
);

CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id);
"#,
    // v2: storage profiles and the file index
    r#"
CREATE TABLE profiles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    storage_path  TEXT NOT NULL UNIQUE,
    quota_limit   INTEGER,               -- bytes, NULL = unlimited
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE files (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id     INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    relative_path  TEXT NOT NULL DEFAULT '',
    size           INTEGER NOT NULL,     -- bytes
    created_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_profile_id ON files(profile_id);
CREATE INDEX idx_files_profile_path ON files(profile_id, relative_path);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_valid_sql() {
        assert!(!MIGRATIONS.is_empty());
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE"));
        }
    }

    #[test]
    fn test_storage_migration_contains_tables() {
        let storage = MIGRATIONS[1];
        assert!(storage.contains("CREATE TABLE profiles"));
        assert!(storage.contains("quota_limit"));
        assert!(storage.contains("CREATE TABLE files"));
        assert!(storage.contains("relative_path"));
    }
}
