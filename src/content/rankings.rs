//! Ranking policy: the fixed set of named 1-10 scales per item type.
//!
//! Pure configuration with no mutable state. A submission must supply
//! exactly these axes; extra keys, missing keys, and out-of-range values
//! are all rejected rather than coerced.

use std::collections::BTreeMap;

use crate::db::models::{ItemType, Rankings};
use crate::error::{AppError, AppResult};

pub const MIN_RANK: i64 = 1;
pub const MAX_RANK: i64 = 10;

const AXES: &[&str] = &["impact", "urgency", "feasibility", "affected", "costs"];

/// Axis keys for an item type, in display order. Both types currently share
/// one set, but callers must not rely on that.
pub fn axes(item_type: ItemType) -> &'static [&'static str] {
    match item_type {
        ItemType::Problem => AXES,
        ItemType::Solution => AXES,
    }
}

/// Check a submitted axis->value map against the policy for `item_type`.
pub fn validate(item_type: ItemType, submitted: &BTreeMap<String, i64>) -> AppResult<Rankings> {
    let expected = axes(item_type);

    for key in submitted.keys() {
        if !expected.contains(&key.as_str()) {
            return Err(AppError::Validation(format!(
                "Unknown ranking axis \"{}\"",
                key
            )));
        }
    }

    let get = |axis: &str| -> AppResult<i64> {
        let value = *submitted
            .get(axis)
            .ok_or_else(|| AppError::Validation(format!("Missing ranking axis \"{}\"", axis)))?;
        if !(MIN_RANK..=MAX_RANK).contains(&value) {
            return Err(AppError::Validation(format!(
                "Ranking \"{}\" must be between {} and {}",
                axis, MIN_RANK, MAX_RANK
            )));
        }
        Ok(value)
    };

    Ok(Rankings {
        impact: get("impact")?,
        urgency: get("urgency")?,
        feasibility: get("feasibility")?,
        affected: get("affected")?,
        costs: get("costs")?,
    })
}
