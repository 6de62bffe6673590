//! Read-side seams between the analytics engine and whatever holds the data.
//!
//! The engine only ever asks two questions: "which orders match this filter"
//! and "which product has this id". [`AppDbState`](crate::local_db_state::AppDbState)
//! answers them from LMDB, [`InMemoryDataset`] from plain vectors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::app_response::AppResponse;
use crate::order_model::{Order, OrderStatus, Product};

/// Predicate over orders. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub customer_id: Option<String>,
    pub statuses: Vec<OrderStatus>,
    /// Inclusive on both ends. Orders without a date never match.
    pub placed_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer_id: &str) -> Self {
        self.customer_id = Some(customer_id.to_string());
        self
    }

    pub fn statuses(mut self, statuses: &[OrderStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn placed_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.placed_between = Some((from, to));
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        if let Some(customer_id) = &self.customer_id {
            if &order.customer_id != customer_id {
                return false;
            }
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
            return false;
        }

        match (&self.placed_between, order.order_date) {
            (None, _) => true,
            (Some((from, to)), Some(placed)) => *from <= placed && placed <= *to,
            (Some(_), None) => false,
        }
    }
}

pub trait OrderSource {
    /// Orders matching `filter`, in the source's natural order.
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppResponse>;
}

pub trait ProductSource {
    /// `Ok(None)` when no product has this id.
    fn product_by_id(&self, id: &str) -> Result<Option<Product>, AppResponse>;
}

/// Orders and products held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    orders: Vec<Order>,
    products: HashMap<String, Product>,
}

impl InMemoryDataset {
    pub fn new(orders: Vec<Order>, products: Vec<Product>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        InMemoryDataset { orders, products }
    }

    pub fn push_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn push_product(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl OrderSource for InMemoryDataset {
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppResponse> {
        Ok(self
            .orders
            .iter()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect())
    }
}

impl ProductSource for InMemoryDataset {
    fn product_by_id(&self, id: &str) -> Result<Option<Product>, AppResponse> {
        Ok(self.products.get(id).cloned())
    }
}
