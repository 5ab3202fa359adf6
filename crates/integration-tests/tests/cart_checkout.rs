//! Cart and checkout flow against the mock backend.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use serde_json::json;
use soundcart_core::{ProductId, StoreId};
use soundcart_integration_tests::{MockBackend, test_config};
use soundcart_storefront::{AppState, ProductSummary};

fn product(id: &str, price: &str) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: price.parse().unwrap(),
        image: None,
        merchant_id: None,
    }
}

fn app_against(backend: &MockBackend) -> AppState {
    AppState::new(test_config(
        &backend.api_base_url(),
        "ws://localhost:9/hubs/notifications",
        None,
        false,
    ))
}

#[tokio::test]
async fn checkout_submits_cart_and_clears_it() {
    let backend = MockBackend::spawn().await;
    let app = app_against(&backend);

    let a = product("prod-a", "10.00");
    app.cart().add_item(&a);
    app.cart().add_item(&a);
    app.cart().add_item(&product("prod-b", "5.50"));

    assert_eq!(app.cart().item_count(), 3);
    assert_eq!(app.cart().total_price(), "25.50".parse::<Decimal>().unwrap());

    let order = app.checkout().await.expect("checkout succeeds");
    assert_eq!(order.id.as_str(), "ord-1");

    // The backend saw the projected lines in insertion order...
    let orders = backend.state.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(
        orders[0],
        json!({"items": [
            {"productId": "prod-a", "quantity": 2},
            {"productId": "prod-b", "quantity": 1},
        ]})
    );

    // ...and the cart cleared only after confirmation.
    assert_eq!(app.cart().item_count(), 0);
    assert_eq!(app.cart().total_price(), Decimal::ZERO);
}

#[tokio::test]
async fn failed_checkout_keeps_the_cart() {
    let backend = MockBackend::spawn().await;
    backend.state.set_fail_orders(true);
    let app = app_against(&backend);

    app.cart().add_item(&product("prod-a", "10.00"));

    let result = app.checkout().await;
    assert!(result.is_err());

    // No order was recorded and the cart is untouched.
    assert!(backend.state.orders().is_empty());
    assert_eq!(app.cart().item_count(), 1);
}

#[tokio::test]
async fn store_menu_is_cached_between_reads() {
    let backend = MockBackend::spawn().await;
    let app = app_against(&backend);

    let store_id = StoreId::new("store-7");
    let first = app.api().store_menu(&store_id).await.expect("menu");
    assert_eq!(first.name, "Mock Records");
    assert_eq!(first.products.len(), 2);
    // Prices arrive as a string for one product and a number for the other;
    // both decode to the same decimal type.
    assert_eq!(
        first.products[0].price,
        "19.99".parse::<Decimal>().unwrap()
    );
    assert_eq!(first.products[1].price, "45".parse::<Decimal>().unwrap());

    let second = app.api().store_menu(&store_id).await.expect("menu");
    assert_eq!(second.products.len(), 2);

    // The second read came from the cache.
    assert_eq!(backend.state.menu_requests(), 1);
}
