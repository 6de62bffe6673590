//! Document and report types for the order store.
//!
//! [`Order`], [`Product`] and [`Customer`] are the documents persisted in the
//! LMDB environment. They serialize with camelCase field names so the JSON
//! stored on disk and sent across the FFI boundary keeps the shape clients
//! already send (`customerId`, `priceAtPurchase`, `orderDate`, ...). A
//! document id may arrive either as `id` or as `_id`.
//!
//! The `*Summary`, `*Rank` and `*Report` types are computed on every call and
//! never written back.
//!
//! # Examples
//!
//! ```rust
//! use order_analytics_core::order_model::{Order, OrderStatus};
//!
//! let order: Order = serde_json::from_str(r#"{
//!     "_id": "o-1",
//!     "customerId": "c1",
//!     "products": [{"productId": "p1", "quantity": 2, "priceAtPurchase": 12.5}],
//!     "totalAmount": 25.0,
//!     "orderDate": "2024-01-05",
//!     "status": "completed"
//! }"#)?;
//!
//! assert_eq!(order.status, OrderStatus::Completed);
//! assert_eq!(order.line_items.len(), 1);
//! # Ok::<(), serde_json::Error>(())
//! ```

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order_date;

/// Lifecycle state of an order.
///
/// The set is open in practice, so strings outside the known five are kept
/// verbatim in [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Completed,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => OrderStatus::Pending,
            "completed" => OrderStatus::Completed,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        OrderStatus::from(raw.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an order's `products` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    pub price_at_purchase: f64,
}

impl LineItem {
    pub fn revenue(&self) -> f64 {
        f64::from(self.quantity) * self.price_at_purchase
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    pub customer_id: String,
    #[serde(rename = "products", default)]
    pub line_items: Vec<LineItem>,
    pub total_amount: f64,
    /// Normalized to UTC on the way in; `None` when the client sent no date.
    #[serde(default, deserialize_with = "order_date::deserialize_optional")]
    pub order_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

impl Order {
    /// Builds a new order from client input under a fresh id.
    ///
    /// `total_amount` is taken as sent; it is not checked against the line items.
    pub fn from_input(input: PlaceOrderInput) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id,
            line_items: input.line_items,
            total_amount: input.total_amount,
            order_date: input.order_date,
            status: input.status,
        }
    }
}

/// Payload of the `placeOrder` mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderInput {
    pub customer_id: String,
    #[serde(rename = "products", default)]
    pub line_items: Vec<LineItem>,
    pub total_amount: f64,
    #[serde(default, deserialize_with = "order_date::deserialize_optional")]
    pub order_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
}

impl Product {
    /// Display name, if the product has a non-empty one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Customer profile. The analytics only ever refer to it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSpendingSummary {
    pub customer_id: String,
    pub total_spent: f64,
    pub average_order_value: f64,
    pub last_order_date: Option<DateTime<Utc>>,
}

impl CustomerSpendingSummary {
    pub fn empty(customer_id: &str) -> Self {
        CustomerSpendingSummary {
            customer_id: customer_id.to_string(),
            total_spent: 0.0,
            average_order_value: 0.0,
            last_order_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesRank {
    pub product_id: String,
    pub name: String,
    pub total_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalyticsReport {
    pub total_revenue: f64,
    pub completed_orders: u64,
    pub category_breakdown: Vec<CategoryRevenue>,
}
