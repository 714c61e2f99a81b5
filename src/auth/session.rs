use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::params;

use crate::error::AppResult;
use crate::state::DbPool;

/// Create a new session for an admin. Returns the session token.
pub fn create_session(pool: &DbPool, admin_id: &str, hours: u64) -> AppResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();
    // Same format as SQLite's datetime('now'), which the session check
    // compares against.
    let expires_at = (Utc::now() + Duration::hours(hours as i64))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    conn.execute(
        "INSERT INTO sessions (id, admin_id, token, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, admin_id, token, expires_at],
    )?;

    Ok(token)
}

/// Delete a session by token (sign-out).
pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
