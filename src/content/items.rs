//! Content item store: problems and solutions.
//!
//! Items are written once at submission and mutated only by the vote
//! counter and the visibility toggle. Both mutations are single SQL
//! statements so concurrent requests cannot lose updates.

use std::collections::BTreeMap;

use rusqlite::params;
use serde::Deserialize;

use crate::content::{categories, rankings};
use crate::db::models::{Item, ItemType, Rankings, SortKey};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub const SHORT_TEXT_MAX: usize = 300;
pub const LONG_TEXT_MIN: usize = 500;
pub const LONG_TEXT_MAX: usize = 2500;

const ITEM_COLUMNS: &str = "id, title, short_text, long_text, category_id, category_name, \
                            category_slug, impact, urgency, feasibility, affected, costs, \
                            upvotes, visible, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    pub short_text: String,
    #[serde(default)]
    pub long_text: Option<String>,
    pub category_slug: String,
    pub rankings: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub sort: SortKey,
}

/// Make a user-supplied needle safe for LIKE: `%` and `_` must match
/// themselves, not act as wildcards. Pairs with `ESCAPE '\'` in the query.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        short_text: row.get(2)?,
        long_text: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        category_slug: row.get(6)?,
        rankings: Rankings {
            impact: row.get(7)?,
            urgency: row.get(8)?,
            feasibility: row.get(9)?,
            affected: row.get(10)?,
            costs: row.get(11)?,
        },
        upvotes: row.get(12)?,
        visible: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Validate and persist a new item. Nothing is written when any check fails.
pub fn create(pool: &DbPool, item_type: ItemType, new: &NewItem) -> AppResult<Item> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }

    let short_text = new.short_text.trim();
    if short_text.is_empty() {
        return Err(AppError::Validation("Short description is required".into()));
    }
    if short_text.chars().count() > SHORT_TEXT_MAX {
        return Err(AppError::Validation(format!(
            "Short description must be at most {} characters",
            SHORT_TEXT_MAX
        )));
    }

    let long_text = new.long_text.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(text) = long_text {
        let len = text.chars().count();
        if !(LONG_TEXT_MIN..=LONG_TEXT_MAX).contains(&len) {
            return Err(AppError::Validation(format!(
                "Detailed description must be between {} and {} characters",
                LONG_TEXT_MIN, LONG_TEXT_MAX
            )));
        }
    }

    let ranks = rankings::validate(item_type, &new.rankings)?;

    let category = categories::get_category_by_slug(pool, &new.category_slug)?
        .ok_or_else(|| AppError::CategoryNotFound(new.category_slug.clone()))?;

    let id = uuid::Uuid::now_v7().to_string();
    let conn = pool.get()?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, title, short_text, long_text, category_id, category_name,
                             category_slug, impact, urgency, feasibility, affected, costs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            item_type.table()
        ),
        params![
            id,
            title,
            short_text,
            long_text,
            category.id,
            category.name,
            category.slug,
            ranks.impact,
            ranks.urgency,
            ranks.feasibility,
            ranks.affected,
            ranks.costs,
        ],
    )?;
    drop(conn);

    get_by_id(pool, item_type, &id, true)?
        .ok_or_else(|| AppError::Internal(format!("Item {} missing after insert", id)))
}

pub fn get_by_id(
    pool: &DbPool,
    item_type: ItemType,
    id: &str,
    include_hidden: bool,
) -> AppResult<Option<Item>> {
    let conn = pool.get()?;
    let mut sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        ITEM_COLUMNS,
        item_type.table()
    );
    if !include_hidden {
        sql.push_str(" AND visible = 1");
    }

    match conn.query_row(&sql, params![id], row_to_item) {
        Ok(item) => Ok(Some(item)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Query-time composition of filter, substring search, and sort. There is no
/// pagination; callers take everything that matches.
pub fn list(
    pool: &DbPool,
    item_type: ItemType,
    filter: &ListFilter,
    include_hidden: bool,
) -> AppResult<Vec<Item>> {
    let mut sql = format!("SELECT {} FROM {} WHERE 1=1", ITEM_COLUMNS, item_type.table());
    let mut binds: Vec<String> = Vec::new();

    if !include_hidden {
        sql.push_str(" AND visible = 1");
    }
    if let Some(ref slug) = filter.category_slug {
        binds.push(slug.clone());
        sql.push_str(&format!(" AND category_slug = ?{}", binds.len()));
    }
    if let Some(ref search) = filter.search {
        // SQLite LIKE is case-insensitive for ASCII.
        binds.push(escape_like(search));
        let n = binds.len();
        sql.push_str(&format!(
            " AND (title LIKE '%' || ?{n} || '%' ESCAPE '\\' \
              OR short_text LIKE '%' || ?{n} || '%' ESCAPE '\\')"
        ));
    }

    // Ids are UUIDv7, so the id tiebreak tracks insertion order within one
    // created_at second.
    sql.push_str(match filter.sort {
        SortKey::MostVoted => " ORDER BY upvotes DESC, id ASC",
        SortKey::Newest => " ORDER BY created_at DESC, id DESC",
        SortKey::MostUrgent => " ORDER BY urgency DESC, id ASC",
    });

    let conn = pool.get()?;
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(binds.iter()), row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Atomic "add 1" at the store; returns the new count. Repeat votes from the
/// same caller all count.
pub fn upvote(pool: &DbPool, item_type: ItemType, id: &str) -> AppResult<i64> {
    let conn = pool.get()?;
    let result = conn.query_row(
        &format!(
            "UPDATE {} SET upvotes = upvotes + 1, updated_at = datetime('now')
             WHERE id = ?1 RETURNING upvotes",
            item_type.table()
        ),
        params![id],
        |row| row.get(0),
    );
    match result {
        Ok(count) => Ok(count),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// Flip the moderation flag; returns the new value.
pub fn toggle_visibility(pool: &DbPool, item_type: ItemType, id: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let result = conn.query_row(
        &format!(
            "UPDATE {} SET visible = NOT visible, updated_at = datetime('now')
             WHERE id = ?1 RETURNING visible",
            item_type.table()
        ),
        params![id],
        |row| row.get(0),
    );
    match result {
        Ok(visible) => Ok(visible),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::categories::seed_categories;
    use crate::db;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        db::run_migrations(&pool).unwrap();
        seed_categories(&pool).unwrap();
        pool
    }

    fn rankings_map(urgency: i64) -> BTreeMap<String, i64> {
        [
            ("impact", 7),
            ("urgency", urgency),
            ("feasibility", 5),
            ("affected", 6),
            ("costs", 3),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn new_item(title: &str, slug: &str, urgency: i64) -> NewItem {
        NewItem {
            title: title.to_string(),
            short_text: "Short desc".to_string(),
            long_text: None,
            category_slug: slug.to_string(),
            rankings: rankings_map(urgency),
        }
    }

    fn count_rows(pool: &DbPool, item_type: ItemType) -> i64 {
        let conn = pool.get().unwrap();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", item_type.table()),
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn create_snapshots_category_and_defaults() {
        let pool = test_pool();
        let item = create(&pool, ItemType::Problem, &new_item("Leak", "environment", 8)).unwrap();

        assert_eq!(item.title, "Leak");
        assert_eq!(item.category_name, "Environment");
        assert_eq!(item.category_slug, "environment");
        assert_eq!(item.upvotes, 0);
        assert!(item.visible);
        assert_eq!(item.rankings.impact, 7);
        assert_eq!(item.rankings.urgency, 8);
    }

    #[test]
    fn create_with_unknown_category_persists_nothing() {
        let pool = test_pool();
        let err = create(&pool, ItemType::Problem, &new_item("Leak", "astrology", 8)).unwrap_err();
        assert!(matches!(err, AppError::CategoryNotFound(_)));
        assert_eq!(count_rows(&pool, ItemType::Problem), 0);
    }

    #[test]
    fn create_with_out_of_range_ranking_persists_nothing() {
        let pool = test_pool();
        for bad in [0, 11] {
            let err =
                create(&pool, ItemType::Problem, &new_item("Leak", "environment", bad)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(count_rows(&pool, ItemType::Problem), 0);
    }

    #[test]
    fn create_rejects_blank_title() {
        let pool = test_pool();
        let err = create(&pool, ItemType::Problem, &new_item("   ", "environment", 5)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_enforces_short_text_bound() {
        let pool = test_pool();
        let mut item = new_item("Leak", "environment", 5);
        item.short_text = "x".repeat(SHORT_TEXT_MAX + 1);
        let err = create(&pool, ItemType::Problem, &item).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_enforces_long_text_bounds_when_present() {
        let pool = test_pool();

        let mut too_short = new_item("Leak", "environment", 5);
        too_short.long_text = Some("x".repeat(LONG_TEXT_MIN - 1));
        assert!(create(&pool, ItemType::Problem, &too_short).is_err());

        let mut too_long = new_item("Leak", "environment", 5);
        too_long.long_text = Some("x".repeat(LONG_TEXT_MAX + 1));
        assert!(create(&pool, ItemType::Problem, &too_long).is_err());

        let mut ok = new_item("Leak", "environment", 5);
        ok.long_text = Some("x".repeat(LONG_TEXT_MIN));
        let item = create(&pool, ItemType::Problem, &ok).unwrap();
        assert_eq!(item.long_text.unwrap().len(), LONG_TEXT_MIN);
    }

    #[test]
    fn upvote_increments_by_exactly_one_per_call() {
        let pool = test_pool();
        let item = create(&pool, ItemType::Problem, &new_item("Leak", "environment", 8)).unwrap();

        for expected in 1..=3 {
            let count = upvote(&pool, ItemType::Problem, &item.id).unwrap();
            assert_eq!(count, expected);
        }

        let stored = get_by_id(&pool, ItemType::Problem, &item.id, false)
            .unwrap()
            .unwrap();
        assert_eq!(stored.upvotes, 3);
    }

    #[test]
    fn upvote_missing_item_is_not_found() {
        let pool = test_pool();
        let err = upvote(&pool, ItemType::Solution, "nope").unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn toggle_twice_restores_original_visibility() {
        let pool = test_pool();
        let item = create(&pool, ItemType::Solution, &new_item("Plan", "housing", 4)).unwrap();

        assert!(!toggle_visibility(&pool, ItemType::Solution, &item.id).unwrap());
        assert!(toggle_visibility(&pool, ItemType::Solution, &item.id).unwrap());

        let stored = get_by_id(&pool, ItemType::Solution, &item.id, true)
            .unwrap()
            .unwrap();
        assert!(stored.visible);
    }

    #[test]
    fn hidden_items_are_excluded_unless_requested() {
        let pool = test_pool();
        let item = create(&pool, ItemType::Problem, &new_item("Leak", "environment", 8)).unwrap();
        toggle_visibility(&pool, ItemType::Problem, &item.id).unwrap();

        assert!(get_by_id(&pool, ItemType::Problem, &item.id, false)
            .unwrap()
            .is_none());
        assert!(get_by_id(&pool, ItemType::Problem, &item.id, true)
            .unwrap()
            .is_some());

        let public = list(&pool, ItemType::Problem, &ListFilter::default(), false).unwrap();
        assert!(public.is_empty());
        let moderated = list(&pool, ItemType::Problem, &ListFilter::default(), true).unwrap();
        assert_eq!(moderated.len(), 1);
    }

    #[test]
    fn most_voted_listing_is_non_increasing() {
        let pool = test_pool();
        let a = create(&pool, ItemType::Problem, &new_item("A", "environment", 2)).unwrap();
        let b = create(&pool, ItemType::Problem, &new_item("B", "environment", 9)).unwrap();
        let _c = create(&pool, ItemType::Problem, &new_item("C", "health", 5)).unwrap();

        upvote(&pool, ItemType::Problem, &b.id).unwrap();
        upvote(&pool, ItemType::Problem, &b.id).unwrap();
        upvote(&pool, ItemType::Problem, &a.id).unwrap();

        let items = list(&pool, ItemType::Problem, &ListFilter::default(), false).unwrap();
        let votes: Vec<i64> = items.iter().map(|i| i.upvotes).collect();
        assert_eq!(votes, vec![2, 1, 0]);
        assert_eq!(items[0].title, "B");
    }

    #[test]
    fn newest_listing_puts_later_items_first() {
        let pool = test_pool();
        for (title, created_at) in [
            ("A", "2026-01-01 00:00:01"),
            ("B", "2026-01-01 00:00:02"),
            ("C", "2026-01-01 00:00:03"),
        ] {
            let item = create(&pool, ItemType::Problem, &new_item(title, "environment", 5)).unwrap();
            let conn = pool.get().unwrap();
            conn.execute(
                "UPDATE problems SET created_at = ?1 WHERE id = ?2",
                params![created_at, item.id],
            )
            .unwrap();
        }

        let filter = ListFilter {
            sort: SortKey::Newest,
            ..Default::default()
        };
        let items = list(&pool, ItemType::Problem, &filter, false).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
    }

    #[test]
    fn most_urgent_sorts_on_the_urgency_axis() {
        let pool = test_pool();
        create(&pool, ItemType::Problem, &new_item("Mild", "environment", 2)).unwrap();
        create(&pool, ItemType::Problem, &new_item("Severe", "environment", 9)).unwrap();
        create(&pool, ItemType::Problem, &new_item("Medium", "environment", 5)).unwrap();

        let filter = ListFilter {
            sort: SortKey::MostUrgent,
            ..Default::default()
        };
        let items = list(&pool, ItemType::Problem, &filter, false).unwrap();
        let urgencies: Vec<i64> = items.iter().map(|i| i.rankings.urgency).collect();
        assert_eq!(urgencies, vec![9, 5, 2]);
    }

    #[test]
    fn listing_filters_by_category() {
        let pool = test_pool();
        create(&pool, ItemType::Problem, &new_item("A", "environment", 2)).unwrap();
        create(&pool, ItemType::Problem, &new_item("B", "health", 9)).unwrap();

        let filter = ListFilter {
            category_slug: Some("health".into()),
            ..Default::default()
        };
        let items = list(&pool, ItemType::Problem, &filter, false).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "B");
    }

    #[test]
    fn search_matches_title_and_short_text_case_insensitively() {
        let pool = test_pool();
        create(&pool, ItemType::Problem, &new_item("Water Leak", "environment", 2)).unwrap();
        let mut other = new_item("Other", "environment", 3);
        other.short_text = "A hidden LEAK in the basement".into();
        create(&pool, ItemType::Problem, &other).unwrap();
        create(&pool, ItemType::Problem, &new_item("Unrelated", "environment", 4)).unwrap();

        let filter = ListFilter {
            search: Some("leak".into()),
            ..Default::default()
        };
        let items = list(&pool, ItemType::Problem, &filter, false).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn search_treats_percent_and_underscore_as_literals() {
        let pool = test_pool();
        create(&pool, ItemType::Problem, &new_item("Budget shortfall", "economy", 5)).unwrap();
        create(&pool, ItemType::Problem, &new_item("20% levy", "economy", 5)).unwrap();

        let search = |needle: &str| {
            let filter = ListFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            list(&pool, ItemType::Problem, &filter, false).unwrap()
        };

        // A wildcard-bearing needle is a literal substring, not a pattern.
        assert!(search("B%l").is_empty());
        assert!(search("B_dget").is_empty());

        // A literal % in the stored text is still findable.
        let hits = search("20%");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "20% levy");
    }

    #[test]
    fn problems_and_solutions_are_separate_stores() {
        let pool = test_pool();
        create(&pool, ItemType::Problem, &new_item("P", "environment", 2)).unwrap();
        create(&pool, ItemType::Solution, &new_item("S", "environment", 3)).unwrap();

        assert_eq!(count_rows(&pool, ItemType::Problem), 1);
        assert_eq!(count_rows(&pool, ItemType::Solution), 1);

        let solutions = list(&pool, ItemType::Solution, &ListFilter::default(), false).unwrap();
        assert_eq!(solutions[0].title, "S");
    }
}
