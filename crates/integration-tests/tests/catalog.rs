//! Catalog pass-through and cache invalidation against the mock backend.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use soundcart_core::{ProductId, StoreId};
use soundcart_integration_tests::{MockBackend, test_config};
use soundcart_storefront::AppState;
use soundcart_storefront::api::NewProduct;

fn app_against(backend: &MockBackend) -> AppState {
    AppState::new(test_config(
        &backend.api_base_url(),
        "ws://localhost:9/hubs/notifications",
        None,
        false,
    ))
}

#[tokio::test]
async fn categories_are_cached_between_reads() {
    let backend = MockBackend::spawn().await;
    let app = app_against(&backend);

    let first = app.api().categories().await.expect("categories");
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].name, "Vinyl");

    let second = app.api().categories().await.expect("categories");
    assert_eq!(second, first);
    assert_eq!(backend.state.category_requests(), 1);
}

#[tokio::test]
async fn product_creation_invalidates_cached_reads() {
    let backend = MockBackend::spawn().await;
    let app = app_against(&backend);

    let store_id = StoreId::new("store-7");
    app.api().store_menu(&store_id).await.expect("menu");
    app.api().categories().await.expect("categories");
    assert_eq!(backend.state.menu_requests(), 1);
    assert_eq!(backend.state.category_requests(), 1);

    let created = app
        .api()
        .create_product(&NewProduct {
            name: "Red Vinyl".to_string(),
            description: None,
            price: "21.00".parse::<Decimal>().unwrap(),
            stock: Some(10),
            image_url: None,
            category: Some("Vinyl".to_string()),
        })
        .await
        .expect("create product");
    assert_eq!(created.id, ProductId::new("prod-new"));
    assert_eq!(created.name, "Red Vinyl");

    // The mutation dropped the cached listings; the next reads go back to
    // the backend.
    app.api().store_menu(&store_id).await.expect("menu");
    app.api().categories().await.expect("categories");
    assert_eq!(backend.state.menu_requests(), 2);
    assert_eq!(backend.state.category_requests(), 2);
}

#[tokio::test]
async fn product_deletion_round_trips() {
    let backend = MockBackend::spawn().await;
    let app = app_against(&backend);

    app.api()
        .delete_product(&ProductId::new("prod-1"))
        .await
        .expect("delete product");
}
