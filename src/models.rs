use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::page_count;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    #[default]
    Expense,
    Income,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "EXPENSE",
            CategoryType::Income => "INCOME",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EXPENSE" => Ok(CategoryType::Expense),
            "INCOME" => Ok(CategoryType::Income),
            other => Err(format!("unknown category type '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub parent_id: Option<i64>,
    pub user_id: String,
    /// 0 for roots, 1 for their children, 2 for grandchildren.
    #[serde(default)]
    pub depth: u32,
}

/// A category together with its nested children, as returned by the non-flat listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCategoryPayload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub category_type: CategoryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Partial update. `type` is deliberately absent, so it is dropped if a caller sends it.
///
/// `parent_id` is tri-state: missing keeps the parent, `null` moves the category
/// to the root, a value re-parents it.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateCategoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<i64>>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CategoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// Paginated list envelope: `{items, total, page, size, pages}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, size: u32) -> Self {
        Self {
            items,
            total,
            page,
            size,
            pages: page_count(total, size),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(rename = "errorCode", default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}
