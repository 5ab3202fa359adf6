//! Catalog and order commands.

use rust_decimal::Decimal;
use soundcart_core::{CurrencyCode, Price, ProductId, StoreId};
use soundcart_storefront::{AppState, ProductSummary};

/// Show a store's menu.
pub async fn menu(app: &AppState, store_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let menu = app.api().store_menu(&StoreId::new(store_id)).await?;

    tracing::info!("{} ({} products)", menu.name, menu.products.len());
    for product in &menu.products {
        let price = Price::new(product.price, CurrencyCode::USD);
        tracing::info!("  {} - {} {}", product.id, product.name, price);
    }

    Ok(())
}

/// Submit an order from `product-id:quantity` pairs.
pub async fn order(app: &AppState, items: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for item in items {
        let (id, quantity) = parse_item(item)?;
        let product_id = ProductId::new(id);

        // The backend resolves names and prices; the cart only carries the
        // line identity and quantity for the submission.
        app.cart().add_item(&ProductSummary {
            id: product_id.clone(),
            name: id.to_string(),
            price: Decimal::ZERO,
            image: None,
            merchant_id: None,
        });
        app.cart().update_quantity(&product_id, quantity);
    }

    let order = app.checkout().await?;
    tracing::info!(
        "Order {} created ({})",
        order.id,
        order.status.as_deref().unwrap_or("pending"),
    );

    Ok(())
}

/// Parse one `product-id:quantity` argument; a bare id means quantity 1.
fn parse_item(item: &str) -> Result<(&str, u32), Box<dyn std::error::Error>> {
    let (id, quantity) = match item.split_once(':') {
        Some((id, quantity)) => (
            id,
            quantity
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{item}'"))?,
        ),
        None => (item, 1),
    };

    if id.is_empty() || quantity == 0 {
        return Err(format!("invalid order item '{item}'").into());
    }
    Ok((id, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_with_quantity() {
        let (id, quantity) = parse_item("prod-1:3").expect("valid item");
        assert_eq!(id, "prod-1");
        assert_eq!(quantity, 3);
    }

    #[test]
    fn test_parse_item_defaults_to_one() {
        let (id, quantity) = parse_item("prod-9").expect("valid item");
        assert_eq!(id, "prod-9");
        assert_eq!(quantity, 1);
    }

    #[test]
    fn test_parse_item_rejects_bad_input() {
        assert!(parse_item("prod-1:abc").is_err());
        assert!(parse_item(":2").is_err());
        assert!(parse_item("prod-1:0").is_err());
    }
}
