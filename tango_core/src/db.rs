//! SQLite storage for users, their settings, and per-word learning logs
//!
//! The drill engine never touches this store; callers load logs and settings
//! from here before a session and write answers back as they happen.

use std::collections::HashMap;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::config::UserSettings;
use crate::error::Result;
use crate::progress::WordLog;

/// Open (creating if needed) the database at `db_path`.
pub fn init_database(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            name TEXT PRIMARY KEY,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS user_settings (
            user TEXT PRIMARY KEY,
            settings_json TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS word_logs (
            user TEXT NOT NULL,
            item_id TEXT NOT NULL,
            seen INTEGER NOT NULL DEFAULT 0,
            correct INTEGER NOT NULL DEFAULT 0,
            streak INTEGER NOT NULL DEFAULT 0,
            wrong_recent INTEGER NOT NULL DEFAULT 0,
            last_shown_at INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user, item_id)
        );
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT
        );",
    )?;
    Ok(())
}

// ------------------ users ------------------

/// Register a user. Blank names are ignored; returns whether a row was added.
pub fn add_user(conn: &Connection, name: &str) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(false);
    }
    let inserted = conn.execute("INSERT OR IGNORE INTO users (name) VALUES (?1)", params![name])?;
    Ok(inserted > 0)
}

pub fn list_users(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM users ORDER BY rowid")?;
    let users = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(users)
}

/// Delete a user along with their settings and logs.
pub fn remove_user(conn: &Connection, name: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM users WHERE name = ?1", params![name])?;
    tx.execute("DELETE FROM user_settings WHERE user = ?1", params![name])?;
    tx.execute("DELETE FROM word_logs WHERE user = ?1", params![name])?;

    if get_current_user(&tx)?.as_deref() == Some(name) {
        set_current_user(&tx, None)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_current_user(conn: &Connection) -> Result<Option<String>> {
    let user = conn
        .query_row("SELECT value FROM app_state WHERE key = 'current_user'", [], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?;
    Ok(user.flatten())
}

pub fn set_current_user(conn: &Connection, name: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES ('current_user', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![name],
    )?;
    Ok(())
}

// ------------------ settings ------------------

/// Stored settings for `user`; unreadable JSON counts as none saved.
pub fn get_user_settings(conn: &Connection, user: &str) -> Result<Option<UserSettings>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT settings_json FROM user_settings WHERE user = ?1",
            params![user],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.and_then(|json| match UserSettings::from_json(&json) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(user, error = %e, "discarding unreadable settings");
            None
        }
    }))
}

pub fn set_user_settings(conn: &Connection, user: &str, settings: &UserSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO user_settings (user, settings_json) VALUES (?1, ?2)
         ON CONFLICT(user) DO UPDATE SET settings_json = excluded.settings_json",
        params![user, settings.to_json()?],
    )?;
    Ok(())
}

// ------------------ logs ------------------

pub fn get_user_logs(conn: &Connection, user: &str) -> Result<HashMap<String, WordLog>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, seen, correct, streak, wrong_recent, last_shown_at
         FROM word_logs WHERE user = ?1",
    )?;
    let rows = stmt.query_map(params![user], |row| {
        Ok((
            row.get::<_, String>(0)?,
            WordLog {
                seen: row.get(1)?,
                correct: row.get(2)?,
                streak: row.get(3)?,
                wrong_recent: row.get(4)?,
                last_shown_at: row.get(5)?,
            },
        ))
    })?;

    let logs = rows.collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(logs)
}

pub fn get_user_log(conn: &Connection, user: &str, item_id: &str) -> Result<Option<WordLog>> {
    let log = conn
        .query_row(
            "SELECT seen, correct, streak, wrong_recent, last_shown_at
             FROM word_logs WHERE user = ?1 AND item_id = ?2",
            params![user, item_id],
            |row| {
                Ok(WordLog {
                    seen: row.get(0)?,
                    correct: row.get(1)?,
                    streak: row.get(2)?,
                    wrong_recent: row.get(3)?,
                    last_shown_at: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(log)
}

pub fn upsert_user_log(conn: &Connection, user: &str, item_id: &str, log: &WordLog) -> Result<()> {
    conn.execute(
        "INSERT INTO word_logs (user, item_id, seen, correct, streak, wrong_recent, last_shown_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user, item_id) DO UPDATE SET
            seen = excluded.seen,
            correct = excluded.correct,
            streak = excluded.streak,
            wrong_recent = excluded.wrong_recent,
            last_shown_at = excluded.last_shown_at",
        params![
            user,
            item_id,
            log.seen,
            log.correct,
            log.streak,
            log.wrong_recent,
            log.last_shown_at
        ],
    )?;
    Ok(())
}

/// Fold one answer into the stored log for `item_id` and return the result.
pub fn record_answer(conn: &Connection, user: &str, item_id: &str, correct: bool, now_ms: i64) -> Result<WordLog> {
    let mut log = get_user_log(conn, user, item_id)?.unwrap_or_default();
    log.record(correct, now_ms);
    upsert_user_log(conn, user, item_id, &log)?;
    Ok(log)
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "init_database")]
pub fn py_init_database(db_path: &str) -> PyResult<()> {
    init_database(db_path)?;
    Ok(())
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "get_user_logs")]
pub fn py_get_user_logs(db_path: &str, user: &str) -> PyResult<HashMap<String, WordLog>> {
    let conn = init_database(db_path)?;
    Ok(get_user_logs(&conn, user)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "record_answer")]
pub fn py_record_answer(db_path: &str, user: &str, item_id: &str, correct: bool) -> PyResult<WordLog> {
    let conn = init_database(db_path)?;
    let now = chrono::Utc::now().timestamp_millis();
    Ok(record_answer(&conn, user, item_id, correct, now)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyMode;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn users_are_trimmed_and_unique() {
        let conn = conn();
        assert!(add_user(&conn, " aki ").unwrap());
        assert!(!add_user(&conn, "aki").unwrap());
        assert!(!add_user(&conn, "   ").unwrap());
        assert!(add_user(&conn, "ben").unwrap());
        assert_eq!(list_users(&conn).unwrap(), vec!["aki", "ben"]);
    }

    #[test]
    fn users_list_in_insertion_order() {
        let conn = conn();
        add_user(&conn, "zed").unwrap();
        add_user(&conn, "amy").unwrap();
        add_user(&conn, "mia").unwrap();
        assert_eq!(list_users(&conn).unwrap(), vec!["zed", "amy", "mia"]);
    }

    #[test]
    fn settings_round_trip_and_bad_json_reads_as_none() {
        let conn = conn();
        assert!(get_user_settings(&conn, "aki").unwrap().is_none());

        let settings = UserSettings {
            unit_ids: vec!["unit-1".into()],
            mode: StudyMode::JaEn,
            question_count: 20,
            ..UserSettings::default()
        };
        set_user_settings(&conn, "aki", &settings).unwrap();
        assert_eq!(get_user_settings(&conn, "aki").unwrap(), Some(settings));

        conn.execute(
            "UPDATE user_settings SET settings_json = '{oops' WHERE user = 'aki'",
            [],
        )
        .unwrap();
        assert!(get_user_settings(&conn, "aki").unwrap().is_none());
    }

    #[test]
    fn record_answer_accumulates_per_item() {
        let conn = conn();
        record_answer(&conn, "aki", "w1", false, 1_000).unwrap();
        record_answer(&conn, "aki", "w1", true, 2_000).unwrap();
        let log = record_answer(&conn, "aki", "w1", true, 3_000).unwrap();
        assert_eq!(log.seen, 3);
        assert_eq!(log.correct, 2);
        assert_eq!(log.streak, 2);
        assert_eq!(log.wrong_recent, 0);
        assert_eq!(log.last_shown_at, 3_000);

        record_answer(&conn, "ben", "w1", false, 4_000).unwrap();
        let logs = get_user_logs(&conn, "aki").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs["w1"], log);
    }

    #[test]
    fn removing_user_cascades() {
        let conn = conn();
        add_user(&conn, "aki").unwrap();
        set_current_user(&conn, Some("aki")).unwrap();
        set_user_settings(&conn, "aki", &UserSettings::default()).unwrap();
        record_answer(&conn, "aki", "w1", true, 1).unwrap();

        remove_user(&conn, "aki").unwrap();
        assert!(list_users(&conn).unwrap().is_empty());
        assert!(get_user_settings(&conn, "aki").unwrap().is_none());
        assert!(get_user_logs(&conn, "aki").unwrap().is_empty());
        assert_eq!(get_current_user(&conn).unwrap(), None);
    }

    #[test]
    fn failed_removal_leaves_user_intact() {
        let conn = conn();
        add_user(&conn, "aki").unwrap();
        record_answer(&conn, "aki", "w1", true, 1).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER block_log_delete BEFORE DELETE ON word_logs
             BEGIN SELECT RAISE(ABORT, 'locked'); END;",
        )
        .unwrap();

        assert!(remove_user(&conn, "aki").is_err());
        assert_eq!(list_users(&conn).unwrap(), vec!["aki"]);
        assert_eq!(get_user_logs(&conn, "aki").unwrap().len(), 1);
        assert!(conn.is_autocommit());
    }
}
