use serde::{Deserialize, Serialize};

/// The two content variants. They share one schema but live in separate
/// tables and may diverge in ranking axes over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Problem,
    Solution,
}

impl ItemType {
    pub fn table(self) -> &'static str {
        match self {
            ItemType::Problem => "problems",
            ItemType::Solution => "solutions",
        }
    }

    /// Parse a path segment. Both singular and plural forms are accepted
    /// because listing pages use the plural.
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "problem" | "problems" => Some(ItemType::Problem),
            "solution" | "solutions" => Some(ItemType::Solution),
            _ => None,
        }
    }
}

/// Listing sort order. `most-urgent` sorts on the urgency ranking axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    MostVoted,
    Newest,
    MostUrgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub website_url: Option<String>,
    pub created_at: String,
}

/// The fixed 1-10 scales attached to every item at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rankings {
    pub impact: i64,
    pub urgency: i64,
    pub feasibility: i64,
    pub affected: i64,
    pub costs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub short_text: String,
    pub long_text: Option<String>,
    // Category label snapshotted at creation time; a later category rename
    // does not relabel existing items.
    pub category_id: String,
    pub category_name: String,
    pub category_slug: String,
    pub rankings: Rankings,
    pub upvotes: i64,
    pub visible: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}
