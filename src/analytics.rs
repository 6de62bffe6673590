//! The three sales reports computed over the order collection.
//!
//! Every report is a filter, group, join, aggregate pass over the orders a
//! source returns. Each one comes in two forms:
//!
//! - `try_*` returns `Result<_, AnalyticsError>` and is what the tests and any
//!   caller that wants to tell "no data" from "broken" should use.
//! - `compute_*` never fails. It logs the error and returns the report's zero
//!   value, which is indistinguishable from a legitimately empty dataset.
//!
//! Sources are only read. Nothing computed here is stored.

use std::collections::{BTreeMap, HashMap};

use log::{debug, error, warn};

use crate::analytics_error::AnalyticsError;
use crate::data_source::{OrderFilter, OrderSource, ProductSource};
use crate::order_date::{day_window, parse_window_day};
use crate::order_model::{
    CategoryRevenue, CustomerSpendingSummary, Order, OrderStatus, ProductSalesRank, SalesAnalyticsReport,
};

pub const DEFAULT_TOP_LIMIT: i64 = 10;

const SPENDING_STATUSES: [OrderStatus; 3] = [OrderStatus::Completed, OrderStatus::Shipped, OrderStatus::Delivered];
const TOP_SELLING_STATUSES: [OrderStatus; 2] = [OrderStatus::Completed, OrderStatus::Shipped];
const SALES_STATUSES: [OrderStatus; 1] = [OrderStatus::Completed];

/// Lifetime spend of one customer over completed, shipped and delivered orders.
pub fn compute_customer_spending<O>(orders: &O, customer_id: &str) -> CustomerSpendingSummary
where
    O: OrderSource + ?Sized,
{
    try_customer_spending(orders, customer_id).unwrap_or_else(|e| {
        report_fallback("getCustomerSpending", &e);
        CustomerSpendingSummary::empty(customer_id)
    })
}

pub fn try_customer_spending<O>(orders: &O, customer_id: &str) -> Result<CustomerSpendingSummary, AnalyticsError>
where
    O: OrderSource + ?Sized,
{
    let filter = OrderFilter::new().customer(customer_id).statuses(&SPENDING_STATUSES);
    let qualifying = qualifying_orders(orders, &filter)?;

    if qualifying.is_empty() {
        debug!("No qualifying orders for customer {customer_id}");
        return Ok(CustomerSpendingSummary::empty(customer_id));
    }

    let total_spent: f64 = qualifying.iter().map(|order| order.total_amount).sum();

    Ok(CustomerSpendingSummary {
        customer_id: customer_id.to_string(),
        total_spent,
        average_order_value: total_spent / qualifying.len() as f64,
        last_order_date: qualifying.iter().filter_map(|order| order.order_date).max(),
    })
}

/// Best sellers by quantity across completed and shipped orders.
///
/// Ties keep the order in which the product was first seen while scanning
/// the source. Products that cannot be resolved to a named product are
/// dropped before the list is cut to `limit`.
pub fn compute_top_selling_products<O, P>(orders: &O, products: &P, limit: i64) -> Vec<ProductSalesRank>
where
    O: OrderSource + ?Sized,
    P: ProductSource + ?Sized,
{
    try_top_selling_products(orders, products, limit).unwrap_or_else(|e| {
        report_fallback("getTopSellingProducts", &e);
        Vec::new()
    })
}

pub fn try_top_selling_products<O, P>(
    orders: &O,
    products: &P,
    limit: i64,
) -> Result<Vec<ProductSalesRank>, AnalyticsError>
where
    O: OrderSource + ?Sized,
    P: ProductSource + ?Sized,
{
    let limit = usize::try_from(limit)
        .ok()
        .filter(|limit| *limit >= 1)
        .ok_or_else(|| AnalyticsError::validation(format!("Limit must be a positive integer, got {limit}")))?;

    let filter = OrderFilter::new().statuses(&TOP_SELLING_STATUSES);
    let qualifying = qualifying_orders(orders, &filter)?;

    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for item in qualifying.iter().flat_map(|order| &order.line_items) {
        let slot = *slots.entry(item.product_id.clone()).or_insert_with(|| {
            totals.push((item.product_id.clone(), 0));
            totals.len() - 1
        });
        totals[slot].1 += u64::from(item.quantity);
    }

    let mut ranked = Vec::with_capacity(totals.len());
    for (product_id, total_sold) in totals {
        let Some(product) = products.product_by_id(&product_id)? else {
            debug!("Dropping unknown product {product_id} from top sellers");
            continue;
        };
        let Some(name) = product.display_name() else {
            debug!("Dropping unnamed product {product_id} from top sellers");
            continue;
        };
        ranked.push(ProductSalesRank {
            product_id,
            name: name.to_string(),
            total_sold,
        });
    }

    ranked.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
    ranked.truncate(limit);
    Ok(ranked)
}

/// Revenue of completed orders placed between two `YYYY-MM-DD` days,
/// both inclusive, with a per-category breakdown sorted by category name.
pub fn compute_sales_analytics<O, P>(orders: &O, products: &P, start_date: &str, end_date: &str) -> SalesAnalyticsReport
where
    O: OrderSource + ?Sized,
    P: ProductSource + ?Sized,
{
    try_sales_analytics(orders, products, start_date, end_date).unwrap_or_else(|e| {
        report_fallback("getSalesAnalytics", &e);
        SalesAnalyticsReport::default()
    })
}

pub fn try_sales_analytics<O, P>(
    orders: &O,
    products: &P,
    start_date: &str,
    end_date: &str,
) -> Result<SalesAnalyticsReport, AnalyticsError>
where
    O: OrderSource + ?Sized,
    P: ProductSource + ?Sized,
{
    let (from, to) = day_window(parse_window_day(start_date)?, parse_window_day(end_date)?)?;

    let filter = OrderFilter::new().statuses(&SALES_STATUSES).placed_between(from, to);
    let qualifying = qualifying_orders(orders, &filter)?;

    let total_revenue: f64 = qualifying.iter().map(|order| order.total_amount).sum();

    // product id -> category, None when the product or its category is missing
    let mut categories: HashMap<&str, Option<String>> = HashMap::new();
    let mut revenue_by_category: BTreeMap<String, f64> = BTreeMap::new();

    for item in qualifying.iter().flat_map(|order| &order.line_items) {
        if !categories.contains_key(item.product_id.as_str()) {
            let resolved = products
                .product_by_id(&item.product_id)?
                .and_then(|product| product.category);
            categories.insert(&item.product_id, resolved);
        }

        if let Some(category) = categories.get(item.product_id.as_str()).cloned().flatten() {
            *revenue_by_category.entry(category).or_insert(0.0) += item.revenue();
        }
    }

    Ok(SalesAnalyticsReport {
        total_revenue,
        completed_orders: qualifying.len() as u64,
        category_breakdown: revenue_by_category
            .into_iter()
            .map(|(category, revenue)| CategoryRevenue { category, revenue })
            .collect(),
    })
}

/// Applies `filter` again on top of whatever the source returned, so a
/// source that ignores part of the filter still yields correct reports.
fn qualifying_orders<O>(orders: &O, filter: &OrderFilter) -> Result<Vec<Order>, AnalyticsError>
where
    O: OrderSource + ?Sized,
{
    let mut found = orders.find_orders(filter)?;
    found.retain(|order| filter.matches(order));
    Ok(found)
}

fn report_fallback(operation: &str, err: &AnalyticsError) {
    match err {
        AnalyticsError::Validation(_) => warn!("{operation} rejected its input, returning empty result: {err}"),
        AnalyticsError::DataAccess(_) => error!("{operation} failed, returning empty result: {err}"),
    }
}
