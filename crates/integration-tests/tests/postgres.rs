//! Repository behaviour against a real `PostgreSQL`.
//!
//! Requires `TRATTORIA_DATABASE_URL` pointing at a disposable database.
//! Run with `cargo test -p trattoria-integration-tests -- --ignored`.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use trattoria_api::db::{ProductRepository, ProductStore, RepositoryError, UniqueKey, create_pool};
use trattoria_api::models::NewProduct;
use trattoria_api::services::SlugResolver;
use trattoria_core::{Price, Rating};

async fn repository() -> ProductRepository {
    let url = std::env::var("TRATTORIA_DATABASE_URL").unwrap();
    let pool = create_pool(&SecretString::from(url)).await.unwrap();
    trattoria_api::MIGRATOR.run(&pool).await.unwrap();
    sqlx::query("TRUNCATE product RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();
    ProductRepository::new(pool)
}

fn draft(slug: &str, name: &str) -> NewProduct {
    NewProduct {
        slug: slug.to_owned(),
        name: name.to_owned(),
        kind: String::new(),
        tags: Vec::new(),
        price: Price::new(499).unwrap(),
        ingredients: vec!["tomato".to_owned()],
        image: String::new(),
        rating: Rating::default(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TRATTORIA_DATABASE_URL)"]
async fn test_unique_constraints_are_classified() {
    let products = repository().await;
    products.insert(&draft("margarita", "Margarita")).await.unwrap();

    assert!(matches!(
        products.insert(&draft("margarita", "Other")).await,
        Err(RepositoryError::Conflict(UniqueKey::Slug))
    ));
    assert!(matches!(
        products.insert(&draft("other", "Margarita")).await,
        Err(RepositoryError::Conflict(UniqueKey::Name))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TRATTORIA_DATABASE_URL)"]
async fn test_resolver_against_postgres() {
    let products = repository().await;
    let cancel = CancellationToken::new();

    let first = SlugResolver::new(&products)
        .insert("margarita", draft("", "Margarita"), &cancel)
        .await
        .unwrap();
    let second = SlugResolver::new(&products)
        .insert("margarita", draft("", "Margarita Bianca"), &cancel)
        .await
        .unwrap();

    assert_eq!(first.slug, "margarita");
    assert_ne!(second.slug, first.slug);
    assert!(second.slug.starts_with("margarita-"));
}
