//! Category registry. Read-mostly: categories are seeded once at startup
//! and consulted by every listing and submission.

use rusqlite::params;

use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// The platform's default topics, seeded idempotently at startup.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Health",
    "Education",
    "Community",
    "Environment",
    "Agriculture",
    "Water, Energy & Resources",
    "Housing",
    "Infrastructure",
    "Mobility",
    "Technology",
    "Economy",
    "Organization",
    "Governance",
];

/// Derive a URL-safe slug from a display name: lowercase, " & " collapsed
/// to a dash, whitespace runs to dashes, commas dropped.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase().replace(", & ", "-").replace(" & ", "-");
    lower
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace(',', "")
}

pub fn list_categories(pool: &DbPool) -> AppResult<Vec<Category>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, slug, image, website_url, created_at
         FROM categories ORDER BY name ASC",
    )?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                image: row.get(3)?,
                website_url: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn get_category_by_slug(pool: &DbPool, slug: &str) -> AppResult<Option<Category>> {
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT id, name, slug, image, website_url, created_at
         FROM categories WHERE slug = ?1",
        params![slug],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                image: row.get(3)?,
                website_url: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    );
    match result {
        Ok(category) => Ok(Some(category)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_category(
    pool: &DbPool,
    name: &str,
    image: Option<&str>,
    website_url: Option<&str>,
) -> AppResult<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }

    let slug = slugify(name);
    let conn = pool.get()?;

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM categories WHERE name = ?1 OR slug = ?2",
        params![name, slug],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AppError::Conflict(format!(
            "Category \"{}\" already exists",
            name
        )));
    }

    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO categories (id, name, slug, image, website_url) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, name, slug, image, website_url],
    )?;
    drop(conn);

    get_category_by_slug(pool, &slug)?.ok_or_else(|| {
        AppError::Internal(format!("Category \"{}\" missing after insert", slug))
    })
}

/// Idempotent: existing rows are left untouched, so a category renamed by an
/// operator is not clobbered on restart.
pub fn seed_categories(pool: &DbPool) -> AppResult<usize> {
    let conn = pool.get()?;
    let mut inserted = 0;
    for name in DEFAULT_CATEGORIES {
        let slug = slugify(name);
        let id = uuid::Uuid::now_v7().to_string();
        inserted += conn.execute(
            "INSERT OR IGNORE INTO categories (id, name, slug) VALUES (?1, ?2, ?3)",
            params![id, name, slug],
        )?;
    }
    if inserted > 0 {
        tracing::info!("Seeded {} categories", inserted);
    }
    Ok(inserted)
}
