//! Backend REST DTOs.
//!
//! Bodies are backend-owned JSON; everything the backend may omit is
//! optional with serde defaults so a partial payload never fails the whole
//! response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use soundcart_core::{CategoryId, MerchantId, NotificationId, OrderId, ProductId, StoreId};

use crate::cart::CartLine;
use crate::notifications::Notification;

/// Notification as returned by `GET /notifications`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<NotificationDto> for Notification {
    fn from(dto: NotificationDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            message: dto.message,
            timestamp: dto.timestamp.unwrap_or_else(Utc::now),
            is_read: dto.is_read,
            link: dto.link,
            user_image: dto.user_image,
            kind: dto.kind,
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<MerchantId>,
}

/// Payload for `POST /products`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Payload for `POST /categories`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A store's menu: the store header plus its product listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMenu {
    #[serde(default)]
    pub id: Option<StoreId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// One line of an order submission.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartLine> for OrderItemInput {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// A created order as returned by `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_dto_minimal_payload() {
        let dto: NotificationDto =
            serde_json::from_value(json!({"id": "n-1"})).expect("minimal payload");

        let notification = Notification::from(dto);
        assert_eq!(notification.id, NotificationId::new("n-1"));
        assert!(notification.title.is_empty());
        assert!(!notification.is_read);
    }

    #[test]
    fn test_order_item_input_from_cart_line() {
        let line = CartLine {
            product_id: ProductId::new("p-1"),
            name: "Vinyl".to_string(),
            unit_price: Decimal::new(1999, 2),
            image: None,
            merchant_id: None,
            quantity: 3,
        };

        let input = OrderItemInput::from(&line);
        assert_eq!(input.product_id, ProductId::new("p-1"));
        assert_eq!(input.quantity, 3);

        let json = serde_json::to_value(&input).expect("serialize");
        assert_eq!(json, json!({"productId": "p-1", "quantity": 3}));
    }

    #[test]
    fn test_product_price_accepts_number_or_string() {
        let from_number: Product =
            serde_json::from_value(json!({"id": "p-1", "name": "LP", "price": 19.99}))
                .expect("numeric price");
        let from_string: Product =
            serde_json::from_value(json!({"id": "p-2", "name": "LP", "price": "19.99"}))
                .expect("string price");

        assert_eq!(from_number.price, from_string.price);
    }

    #[test]
    fn test_store_menu_defaults() {
        let menu: StoreMenu = serde_json::from_value(json!({})).expect("empty menu");
        assert!(menu.id.is_none());
        assert!(menu.products.is_empty());
    }
}
