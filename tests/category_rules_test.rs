/// Hierarchy, uniqueness and delete rules enforced by the category service.
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{create_category, create_category_id, json_request};

async fn list_flat(app: &common::TestApp, token: &str) -> Vec<Value> {
    let (status, body) = json_request(
        app,
        "GET",
        "/categories/?flat=true&size=100",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "flat list: {body}");
    body["items"].as_array().cloned().unwrap_or_default()
}

fn names(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|c| c["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_levels_allowed_fourth_rejected_without_mutation() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_depth").await.expect("login");

    let food = create_category_id(&app, &token, "Food", None).await;
    let groceries = create_category_id(&app, &token, "Groceries", Some(food)).await;

    let (status, body) = create_category(&app, &token, "Snacks", "EXPENSE", Some(groceries)).await;
    assert_eq!(status, StatusCode::CREATED, "third level is allowed: {body}");
    assert_eq!(body["depth"], 2);
    let snacks = body["id"].as_i64().expect("id");

    let (status, body) = create_category(&app, &token, "Chips", "EXPENSE", Some(snacks)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_DEPTH_EXCEEDED");

    let (status, body) = create_category(&app, &token, "Bakery", "EXPENSE", Some(food)).await;
    assert_eq!(status, StatusCode::CREATED, "sibling of Groceries: {body}");
    assert_eq!(body["depth"], 1);

    let listed = names(&list_flat(&app, &token).await);
    assert!(!listed.contains(&"Chips".to_string()));
    assert_eq!(listed.len(), 4);
}

#[tokio::test]
async fn moving_a_subtree_under_a_deep_node_is_rejected() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_move").await.expect("login");

    let food = create_category_id(&app, &token, "Food", None).await;
    let groceries = create_category_id(&app, &token, "Groceries", Some(food)).await;
    let transport = create_category_id(&app, &token, "Transport", None).await;
    let fuel = create_category_id(&app, &token, "Fuel", Some(transport)).await;

    // Transport has a child, so under Groceries its child would land at depth 3
    let (status, body) = json_request(
        &app,
        "PUT",
        &format!("/categories/{transport}"),
        Some(&token),
        Some(json!({ "parent_id": groceries })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_DEPTH_EXCEEDED");

    // Moving the leaf is fine
    let (status, body) = json_request(
        &app,
        "PUT",
        &format!("/categories/{fuel}"),
        Some(&token),
        Some(json!({ "parent_id": groceries })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["depth"], 2);
    assert_eq!(body["parent_id"], groceries);

    let (_, transport_body) =
        json_request(&app, "GET", &format!("/categories/{transport}"), Some(&token), None).await;
    assert_eq!(transport_body["parent_id"], Value::Null);
}

#[tokio::test]
async fn category_cannot_become_its_own_ancestor() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_cycle").await.expect("login");

    let food = create_category_id(&app, &token, "Food", None).await;
    let groceries = create_category_id(&app, &token, "Groceries", Some(food)).await;

    for parent in [food, groceries] {
        let (status, body) = json_request(
            &app,
            "PUT",
            &format!("/categories/{food}"),
            Some(&token),
            Some(json!({ "parent_id": parent })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errorCode"], "CATEGORY_CIRCULAR_RELATIONSHIP");
    }
}

// ---------------------------------------------------------------------------
// Uniqueness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_name_per_user_and_type_conflicts() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_unique").await.expect("login");

    let (status, first) = create_category(&app, &token, "Food", "EXPENSE", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_category(&app, &token, "Food", "EXPENSE", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "CATEGORY_NAME_CONFLICT");

    // Case-insensitive after trimming
    let (status, _) = create_category(&app, &token, "  food ", "EXPENSE", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Same name with the other type is a different scope
    let (status, _) = create_category(&app, &token, "Food", "INCOME", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, unchanged) = json_request(
        &app,
        "GET",
        &format!("/categories/{}", first["id"]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(unchanged, first);
}

#[tokio::test]
async fn rename_into_existing_name_conflicts_but_self_rename_is_fine() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_rename").await.expect("login");

    create_category_id(&app, &token, "Food", None).await;
    let travel = create_category_id(&app, &token, "Travel", None).await;

    let (status, body) = json_request(
        &app,
        "PUT",
        &format!("/categories/{travel}"),
        Some(&token),
        Some(json!({ "name": "FOOD" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "CATEGORY_NAME_CONFLICT");

    let (status, body) = json_request(
        &app,
        "PUT",
        &format!("/categories/{travel}"),
        Some(&token),
        Some(json!({ "name": "travel" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "travel");
}

#[tokio::test]
async fn same_name_allowed_for_different_users() {
    let app = common::setup_test_app().await.expect("setup failed");
    let alice = common::register_and_login(&app, "alice_users").await.expect("login");
    let bob = common::register_and_login(&app, "bob_users").await.expect("login");

    let alice_id = create_category_id(&app, &alice, "Groceries", None).await;
    let bob_id = create_category_id(&app, &bob, "Groceries", None).await;
    assert_ne!(alice_id, bob_id);
}

// ---------------------------------------------------------------------------
// Validation and type immutability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_name_is_a_validation_error() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_blank").await.expect("login");

    let (status, body) = create_category(&app, &token, "   ", "EXPENSE", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_VALIDATION_ERROR");
    assert!(body["detail"].as_str().unwrap_or_default().contains("cannot be empty"));
}

#[tokio::test]
async fn update_never_changes_type() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_type").await.expect("login");

    let id = create_category_id(&app, &token, "Rent", None).await;
    let (status, body) = json_request(
        &app,
        "PUT",
        &format!("/categories/{id}"),
        Some(&token),
        Some(json!({ "name": "Housing", "type": "INCOME" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Housing");
    assert_eq!(body["type"], "EXPENSE");

    let (_, fetched) = json_request(&app, "GET", &format!("/categories/{id}"), Some(&token), None).await;
    assert_eq!(fetched["type"], "EXPENSE");
}

// ---------------------------------------------------------------------------
// Delete protection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parent_with_children_cannot_be_deleted_but_leaf_can() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_delete").await.expect("login");

    let food = create_category_id(&app, &token, "Food", None).await;
    let groceries = create_category_id(&app, &token, "Groceries", Some(food)).await;

    let (status, body) =
        json_request(&app, "DELETE", &format!("/categories/{food}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "CATEGORY_HAS_CHILDREN");
    assert_eq!(names(&list_flat(&app, &token).await), vec!["Food", "Groceries"]);

    let (status, _) =
        json_request(&app, "DELETE", &format!("/categories/{groceries}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(names(&list_flat(&app, &token).await), vec!["Food"]);

    let (status, _) =
        json_request(&app, "DELETE", &format!("/categories/{food}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(list_flat(&app, &token).await.is_empty());
}

// ---------------------------------------------------------------------------
// Ownership and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_users_categories_are_invisible_and_unusable() {
    let app = common::setup_test_app().await.expect("setup failed");
    let alice = common::register_and_login(&app, "alice_owner").await.expect("login");
    let bob = common::register_and_login(&app, "bob_owner").await.expect("login");

    let bob_food = create_category_id(&app, &bob, "Food", None).await;

    let (status, body) = create_category(&app, &alice, "Snacks", "EXPENSE", Some(bob_food)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "CATEGORY_OWNERSHIP_ERROR");

    let (status, _) =
        json_request(&app, "GET", &format!("/categories/{bob_food}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &app,
        "PUT",
        &format!("/categories/{bob_food}"),
        Some(&alice),
        Some(json!({ "name": "Hacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        json_request(&app, "DELETE", &format!("/categories/{bob_food}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = create_category(&app, &alice, "Snacks", "EXPENSE", Some(999_999)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "CATEGORY_NOT_FOUND");
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let app = common::setup_test_app().await.expect("setup failed");

    let (status, body) = json_request(&app, "GET", "/categories/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], "UNAUTHORIZED");

    let (status, _) = json_request(&app, "GET", "/categories/", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = common::register_and_login(&app, "alice_logout").await.expect("login");
    let (status, _) = json_request(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = json_request(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hierarchical_listing_paginates_roots_with_nested_children() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "alice_list").await.expect("login");

    let food = create_category_id(&app, &token, "Food", None).await;
    let groceries = create_category_id(&app, &token, "Groceries", Some(food)).await;
    create_category_id(&app, &token, "Organic", Some(groceries)).await;
    for name in ["Housing", "Transport", "Utilities"] {
        create_category_id(&app, &token, name, None).await;
    }

    let (status, body) =
        json_request(&app, "GET", "/categories/?page=1&size=3", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["pages"], 2);
    assert_eq!(body["size"], 3);
    assert_eq!(body["items"][0]["name"], "Food");
    assert_eq!(body["items"][0]["children"][0]["name"], "Groceries");
    assert_eq!(body["items"][0]["children"][0]["children"][0]["name"], "Organic");
    assert_eq!(body["items"][0]["children"][0]["children"][0]["depth"], 2);

    let (_, page_two) =
        json_request(&app, "GET", "/categories/?page=2&size=3", Some(&token), None).await;
    assert_eq!(names(page_two["items"].as_array().expect("items")), vec!["Utilities"]);

    let flat = list_flat(&app, &token).await;
    assert_eq!(flat.len(), 6);
    assert!(flat.iter().all(|c| c.get("children").is_none()));

    let (status, body) =
        json_request(&app, "GET", "/categories/?size=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_requests_use_the_error_envelope() {
    let app = common::setup_test_app().await.expect("setup failed");
    let token = common::register_and_login(&app, "malformed_user")
        .await
        .expect("login");

    let (status, body) = json_request(
        &app,
        "POST",
        "/categories/",
        Some(&token),
        Some(json!({ "name": "Food", "type": "SAVINGS" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_VALIDATION_ERROR");
    assert!(body["detail"].as_str().unwrap_or_default().contains("SAVINGS"));

    let (status, body) =
        json_request(&app, "GET", "/categories/?page=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "CATEGORY_VALIDATION_ERROR");
    assert!(!body["detail"].as_str().unwrap_or_default().is_empty());

    assert!(list_flat(&app, &token).await.is_empty());
}

#[tokio::test]
async fn concurrent_registrations_of_one_name_conflict_cleanly() {
    let app = common::setup_test_app().await.expect("setup failed");
    let payload = json!({ "username": "racer", "password": common::TEST_PASSWORD });

    let (a, b, c) = tokio::join!(
        json_request(&app, "POST", "/auth/register", None, Some(payload.clone())),
        json_request(&app, "POST", "/auth/register", None, Some(payload.clone())),
        json_request(&app, "POST", "/auth/register", None, Some(payload.clone())),
    );
    let statuses = [a.0, b.0, c.0];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1,
        "{statuses:?}"
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        2,
        "{statuses:?}"
    );
}
