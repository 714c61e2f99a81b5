//! Admin directory: the small credentials table consulted on every login
//! and every gated action.

use rusqlite::params;

use crate::config::AuthConfig;
use crate::db::models::Admin;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub const PASSWORD_MIN_LEN: usize = 6;

/// Create an admin account. Authorization (only an existing admin may call
/// this) is enforced at the route layer; the very first admin comes from
/// `ensure_bootstrap_admin`.
pub fn add_admin(pool: &DbPool, email: &str, password: &str) -> AppResult<Admin> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if password.len() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }

    if find_by_email(pool, &email)?.is_some() {
        return Err(AppError::Conflict(
            "An admin with this email already exists".into(),
        ));
    }

    insert_admin(pool, &email, password)
}

/// Hash and insert without the request-level validation. Callers must pass a
/// trimmed, lowercased email. The UNIQUE index is the last word on duplicate
/// emails; two concurrent adds race past the lookup in `add_admin` and the
/// loser ends up here.
pub(crate) fn insert_admin(pool: &DbPool, email: &str, password: &str) -> AppResult<Admin> {
    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let id = uuid::Uuid::now_v7().to_string();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO admins (id, email, password_hash) VALUES (?1, ?2, ?3)",
        params![id, email, password_hash],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AppError::Conflict("An admin with this email already exists".into())
        }
        e => AppError::from(e),
    })?;
    drop(conn);

    find_by_email(pool, email)?
        .ok_or_else(|| AppError::Internal(format!("Admin {} missing after insert", email)))
}

pub fn find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<Admin>> {
    let email = email.trim().to_lowercase();
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT id, email, password_hash, created_at FROM admins WHERE email = ?1",
        params![email],
        |row| {
            Ok(Admin {
                id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    );
    match result {
        Ok(admin) => Ok(Some(admin)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Live authority check against the directory, never a cached claim, so a
/// removed admin loses access on their next request.
pub fn is_admin(pool: &DbPool, email: &str) -> AppResult<bool> {
    Ok(find_by_email(pool, email)?.is_some())
}

/// Verify credentials. Unknown email and wrong password are
/// indistinguishable to the caller.
pub fn authenticate(pool: &DbPool, email: &str, password: &str) -> AppResult<Option<Admin>> {
    let Some(admin) = find_by_email(pool, email)? else {
        return Ok(None);
    };
    if bcrypt::verify(password, &admin.password_hash)? {
        Ok(Some(admin))
    } else {
        Ok(None)
    }
}

/// Provision the first admin from config at startup. An already-existing
/// account is left alone.
pub fn ensure_bootstrap_admin(pool: &DbPool, auth: &AuthConfig) -> AppResult<()> {
    let (Some(email), Some(password)) = (&auth.bootstrap_email, &auth.bootstrap_password) else {
        return Ok(());
    };

    match add_admin(pool, email, password) {
        Ok(admin) => {
            tracing::info!("Bootstrapped admin account {}", admin.email);
            Ok(())
        }
        Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
