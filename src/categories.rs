use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use libsql::{Connection, Value};
use serde::Serialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::constants::*;
use crate::errors::ServiceError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::{
    Category, CategoryNode, CategoryQuery, CreateCategoryPayload, Page, UpdateCategoryPayload,
};
use crate::transaction::with_transaction;
use crate::tree;
use crate::utils::{
    db_error, db_error_with_context, validate_page, validate_page_size, validate_string_length,
};

pub fn validate_category_name(name: &str) -> Result<(), ServiceError> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

/// Listing body: flat categories or root nodes with nested children.
#[derive(Serialize)]
#[serde(untagged)]
pub enum CategoryListing {
    Flat(Page<Category>),
    Tree(Page<CategoryNode>),
}

pub fn extract_category_from_row(row: libsql::Row) -> Result<Category, ServiceError> {
    let invalid = || db_error_with_context("invalid category data");

    let id: i64 = row.get(0).map_err(|_| invalid())?;
    let name: String = row.get(1).map_err(|_| invalid())?;
    let category_type: String = row.get(2).map_err(|_| invalid())?;
    let parent_id = match row.get_value(3).map_err(|_| invalid())? {
        Value::Integer(parent_id) => Some(parent_id),
        Value::Null => None,
        _ => return Err(invalid()),
    };
    let user_id: String = row.get(4).map_err(|_| invalid())?;

    Ok(Category {
        id,
        name,
        category_type: category_type.parse().map_err(|_| invalid())?,
        parent_id,
        user_id,
        depth: 0,
    })
}

/// Loads every category of `user_id` with depths filled in.
async fn load_user_categories(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<Category>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT id, name, type, parent_id, user_id FROM categories WHERE user_id = ? ORDER BY id ASC",
            [user_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query categories"))?;

    let mut categories = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        categories.push(extract_category_from_row(row)?);
    }
    Ok(tree::with_depths(categories))
}

/// Distinguishes "no such parent" from "parent owned by someone else".
async fn check_parent_ownership(
    conn: &Connection,
    user_id: &str,
    parent_id: i64,
    own: &[Category],
) -> Result<(), ServiceError> {
    if tree::find(own, parent_id).is_some() {
        return Ok(());
    }

    let mut rows = conn
        .query("SELECT user_id FROM categories WHERE id = ?", [parent_id])
        .await
        .map_err(|_| db_error_with_context("failed to check parent category"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(_) => {
            tracing::warn!(user_id, parent_id, "parent category owned by another user");
            Err(ServiceError::Ownership)
        }
        None => Err(ServiceError::NotFound(
            "Parent category not found".to_string(),
        )),
    }
}

/// Case-insensitive name check scoped to (user, type), ignoring `exclude_id`.
fn check_name_available(
    own: &[Category],
    candidate: &Category,
    exclude_id: Option<i64>,
) -> Result<(), ServiceError> {
    let lowered = candidate.name.to_lowercase();
    let taken = own.iter().any(|c| {
        Some(c.id) != exclude_id
            && c.category_type == candidate.category_type
            && c.name.to_lowercase() == lowered
    });
    if taken {
        tracing::warn!(user_id = %candidate.user_id, name = %candidate.name, "category name conflict");
        return Err(ServiceError::NameConflict);
    }
    Ok(())
}

fn parent_value(parent_id: Option<i64>) -> Value {
    match parent_id {
        Some(id) => Value::Integer(id),
        None => Value::Null,
    }
}

pub async fn create_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), ServiceError> {
    validate_category_name(&payload.name)?;
    let category_name = payload.name.trim().to_string();
    let category_type = payload.category_type;
    let parent_id = payload.parent_id;
    let owner_user_id = user.id;

    let result: Result<Category, ServiceError> = with_transaction(&app_state.db, move |conn| {
        Box::pin(async move {
            let own = load_user_categories(conn, &owner_user_id).await?;

            let mut category = Category {
                id: 0,
                name: category_name,
                category_type,
                parent_id,
                user_id: owner_user_id,
                depth: 0,
            };
            check_name_available(&own, &category, None)?;

            if let Some(parent_id) = parent_id {
                check_parent_ownership(conn, &category.user_id, parent_id, &own).await?;
            }
            if let Err(violation) = tree::validate_parent(None, parent_id, &own) {
                tracing::warn!(user_id = %category.user_id, ?parent_id, ?violation, "category create rejected");
                return Err(violation.into());
            }

            conn.execute(
                "INSERT INTO categories (user_id, name, type, parent_id) VALUES (?, ?, ?, ?)",
                (
                    category.user_id.as_str(),
                    category.name.as_str(),
                    category.category_type.as_str(),
                    parent_value(parent_id),
                ),
            )
            .await
            .map_err(|_| db_error_with_context("category creation failed"))?;

            category.id = conn.last_insert_rowid();
            category.depth = parent_id
                .and_then(|p| tree::find(&own, p))
                .map(|parent| parent.depth + 1)
                .unwrap_or(0);
            Ok::<_, ServiceError>(category)
        })
    })
    .await;

    let category = result?;
    tracing::info!(category_id = category.id, depth = category.depth, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidQuery(query): ValidQuery<CategoryQuery>,
) -> Result<(StatusCode, Json<CategoryListing>), ServiceError> {
    let page = validate_page(query.page)?;
    let size = validate_page_size(query.size)?;
    let offset = ((page - 1) as usize).saturating_mul(size as usize);

    let conn = app_state.db.read().await;
    let categories = load_user_categories(&conn, &user.id).await?;

    let listing = if query.flat.unwrap_or(false) {
        let mut categories = categories;
        categories.sort_by_key(|c| (c.depth, c.name.to_lowercase(), c.id));
        let total = categories.len() as u64;
        let items = categories.into_iter().skip(offset).take(size as usize).collect();
        CategoryListing::Flat(Page::new(items, total, page, size))
    } else {
        let roots = tree::build_tree(&categories);
        let total = roots.len() as u64;
        let items = roots.into_iter().skip(offset).take(size as usize).collect();
        CategoryListing::Tree(Page::new(items, total, page, size))
    };

    Ok((StatusCode::OK, Json(listing)))
}

pub async fn get_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i64>,
) -> Result<(StatusCode, Json<Category>), ServiceError> {
    let conn = app_state.db.read().await;
    let categories = load_user_categories(&conn, &user.id).await?;

    let category = tree::find(&categories, category_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

    Ok((StatusCode::OK, Json(category)))
}

pub async fn update_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), ServiceError> {
    let new_name = match payload.name {
        Some(ref name) => {
            validate_category_name(name)?;
            Some(name.trim().to_string())
        }
        None => None,
    };
    let new_parent = payload.parent_id;
    let owner_user_id = user.id;

    let result: Result<Category, ServiceError> = with_transaction(&app_state.db, move |conn| {
        Box::pin(async move {
            let own = load_user_categories(conn, &owner_user_id).await?;
            let existing = tree::find(&own, category_id)
                .cloned()
                .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

            let mut updated = existing.clone();
            if let Some(name) = new_name {
                updated.name = name;
                check_name_available(&own, &updated, Some(existing.id))?;
            }

            if let Some(parent_id) = new_parent {
                if let Some(parent_id) = parent_id {
                    check_parent_ownership(conn, &owner_user_id, parent_id, &own).await?;
                }
                if let Err(violation) = tree::validate_parent(Some(&existing), parent_id, &own) {
                    tracing::warn!(category_id, ?parent_id, ?violation, "category update rejected");
                    return Err(violation.into());
                }
                updated.parent_id = parent_id;
                updated.depth = parent_id
                    .and_then(|p| tree::find(&own, p))
                    .map(|parent| parent.depth + 1)
                    .unwrap_or(0);
            }

            if updated == existing {
                return Ok(existing);
            }

            let affected_rows = conn
                .execute(
                    "UPDATE categories SET name = ?, parent_id = ? WHERE id = ? AND user_id = ?",
                    (
                        updated.name.as_str(),
                        parent_value(updated.parent_id),
                        category_id,
                        owner_user_id.as_str(),
                    ),
                )
                .await
                .map_err(|_| db_error_with_context("failed to update category"))?;

            if affected_rows == 0 {
                return Err(ServiceError::NotFound("Category not found".to_string()));
            }
            Ok::<_, ServiceError>(updated)
        })
    })
    .await;

    Ok((StatusCode::OK, Json(result?)))
}

pub async fn delete_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    let conn = app_state.db.write().await;
    let own = load_user_categories(&conn, &user.id).await?;

    if tree::find(&own, category_id).is_none() {
        return Err(ServiceError::NotFound("Category not found".to_string()));
    }
    if tree::has_children(category_id, &own) {
        tracing::warn!(category_id, "refusing to delete category with children");
        return Err(ServiceError::HasChildren);
    }

    let affected_rows = conn
        .execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            (category_id, user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete category"))?;

    if affected_rows == 0 {
        return Err(ServiceError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
