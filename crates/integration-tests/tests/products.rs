//! Catalogue endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use trattoria_integration_tests::{ADMIN_TOKEN, TestContext};

fn margarita() -> serde_json::Value {
    json!({
        "name": "Маргарита",
        "type": "pizza",
        "tags": ["classic"],
        "price": 499,
        "ingredients": ["tomato", "mozzarella", "basil"],
        "rating": 4.5
    })
}

#[tokio::test]
async fn test_create_derives_slug() {
    let ctx = TestContext::new();
    let created = ctx.create_product(margarita()).await;
    assert_eq!(created["slug"], "margarita");
    assert_eq!(created["type"], "pizza");
    assert_eq!(created["price"], 499);

    let fetched = ctx.get("/products/margarita", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["name"], "Маргарита");
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let ctx = TestContext::new();
    ctx.create_product(margarita()).await;

    let response = ctx.post("/products", Some(ADMIN_TOKEN), margarita()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_slug_collision_gets_suffix() {
    let ctx = TestContext::new();
    ctx.create_product(margarita()).await;

    let twin = ctx
        .create_product(json!({ "name": "Margarita", "price": 450 }))
        .await;
    let slug = twin["slug"].as_str().unwrap();
    let suffix = slug.strip_prefix("margarita-").unwrap();
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn test_invalid_payloads() {
    let ctx = TestContext::new();

    let zero_price = ctx
        .post("/products", Some(ADMIN_TOKEN), json!({ "name": "Free", "price": 0 }))
        .await;
    assert_eq!(zero_price.status, StatusCode::BAD_REQUEST);

    let blank_name = ctx
        .post("/products", Some(ADMIN_TOKEN), json!({ "name": "  ", "price": 100 }))
        .await;
    assert_eq!(blank_name.status, StatusCode::BAD_REQUEST);

    let bad_rating = ctx
        .post(
            "/products",
            Some(ADMIN_TOKEN),
            json!({ "name": "Calzone", "price": 100, "rating": 7.5 }),
        )
        .await;
    assert_eq!(bad_rating.status, StatusCode::BAD_REQUEST);

    let not_json = ctx
        .post("/products", Some(ADMIN_TOKEN), json!(["not", "an", "object"]))
        .await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
    assert!(not_json.body["error"].is_string());
}

#[tokio::test]
async fn test_writes_require_admin_token() {
    let ctx = TestContext::new();

    let anonymous = ctx.post("/products", None, margarita()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let wrong = ctx.post("/products", Some("guess"), margarita()).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let user = ctx.register("Ivan", "ivan@example.com").await;
    let as_user = ctx.post("/products", Some(&user), margarita()).await;
    assert_eq!(as_user.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patch_merges_present_fields() {
    let ctx = TestContext::new();
    ctx.create_product(margarita()).await;

    let response = ctx
        .patch("/products/margarita", Some(ADMIN_TOKEN), json!({ "price": 550 }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["price"], 550);
    assert_eq!(response.body["rating"], 4.5);
    assert_eq!(response.body["ingredients"], json!(["tomato", "mozzarella", "basil"]));

    let empty = ctx
        .patch("/products/margarita", Some(ADMIN_TOKEN), json!({}))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "at least one field required");

    let missing = ctx
        .patch("/products/quattro", Some(ADMIN_TOKEN), json!({ "price": 1 }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_slug() {
    let ctx = TestContext::new();
    let original = ctx.create_product(margarita()).await;
    ctx.create_product(json!({ "name": "Pepperoni", "price": 599 }))
        .await;

    let taken = ctx
        .post(
            "/products/margarita/change",
            Some(ADMIN_TOKEN),
            json!({ "slug": "Pepperoni" }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.get("/products/margarita", None).await.status, StatusCode::OK);

    let renamed = ctx
        .post(
            "/products/margarita/change",
            Some(ADMIN_TOKEN),
            json!({ "slug": "Маргарита 2025" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["slug"], "margarita-2025");
    assert_eq!(renamed.body["id"], original["id"]);
    assert_eq!(renamed.body["created_at"], original["created_at"]);

    assert_eq!(
        ctx.get("/products/margarita", None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_list_and_delete() {
    let ctx = TestContext::new();
    for (name, price) in [("Margarita", 499), ("Pepperoni", 599), ("Diavola", 649)] {
        ctx.create_product(json!({ "name": name, "price": price }))
            .await;
    }

    let listed = ctx.get("/products?limit=2", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let slugs: Vec<_> = listed.body.as_array().unwrap().iter().map(|p| p["slug"].clone()).collect();
    assert_eq!(slugs, [json!("diavola"), json!("pepperoni")]);

    let negative = ctx.get("/products?offset=-1", None).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let deleted = ctx.delete("/products/pepperoni", Some(ADMIN_TOKEN)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let again = ctx.delete("/products/pepperoni", Some(ADMIN_TOKEN)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_list_query_is_json_error() {
    let ctx = TestContext::new();

    let response = ctx.get("/products?limit=abc", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string(), "got {}", response.body);
}
