//! Request/response surface: the three read operations and `placeOrder`.
//!
//! Requests arrive as JSON envelopes:
//!
//! ```json
//! {"operation": "getTopSellingProducts", "variables": {"limit": 5}}
//! {"operation": "getSalesAnalytics", "variables": {"startDate": "2024-01-01", "endDate": "2024-01-31"}}
//! {"operation": "placeOrder", "variables": {"input": {"customerId": "c1", "products": [], "totalAmount": 0, "status": "pending"}}}
//! ```
//!
//! The read operations are fail-soft and always answer with a report.
//! `placeOrder` writes to the store and reports its failures.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::analytics::{self, DEFAULT_TOP_LIMIT};
use crate::analytics_error::AnalyticsError;
use crate::app_response::AppResponse;
use crate::data_source::{OrderSource, ProductSource};
use crate::local_db_state::AppDbState;
use crate::order_model::{
    CustomerSpendingSummary, Order, PlaceOrderInput, ProductSalesRank, SalesAnalyticsReport,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", content = "variables", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    GetCustomerSpending { customer_id: String },
    /// `limit` stays raw JSON so a non-integer can be rejected like a bad value.
    GetTopSellingProducts {
        #[serde(default)]
        limit: Option<JsonValue>,
    },
    #[serde(rename_all = "camelCase")]
    GetSalesAnalytics { start_date: String, end_date: String },
    PlaceOrder { input: PlaceOrderInput },
}

pub fn get_customer_spending<S>(source: &S, customer_id: &str) -> CustomerSpendingSummary
where
    S: OrderSource + ?Sized,
{
    analytics::compute_customer_spending(source, customer_id)
}

/// `limit` defaults to 10 when absent or `null`.
pub fn get_top_selling_products<S>(source: &S, limit: Option<&JsonValue>) -> Vec<ProductSalesRank>
where
    S: OrderSource + ProductSource + ?Sized,
{
    match parse_limit(limit) {
        Ok(limit) => analytics::compute_top_selling_products(source, source, limit),
        Err(e) => {
            warn!("getTopSellingProducts rejected its input, returning empty result: {e}");
            Vec::new()
        }
    }
}

pub fn get_sales_analytics<S>(source: &S, start_date: &str, end_date: &str) -> SalesAnalyticsReport
where
    S: OrderSource + ProductSource + ?Sized,
{
    analytics::compute_sales_analytics(source, source, start_date, end_date)
}

pub fn place_order(state: &AppDbState, input: PlaceOrderInput) -> Result<Order, AppResponse> {
    let order = state.place_order(input)?;
    debug!("Order {} stored", order.id);
    Ok(order)
}

/// Runs one request and returns its JSON payload.
pub fn execute(state: &AppDbState, request: Request) -> Result<JsonValue, AppResponse> {
    let payload = match request {
        Request::GetCustomerSpending { customer_id } => {
            serde_json::to_value(get_customer_spending(state, &customer_id))?
        }
        Request::GetTopSellingProducts { limit } => {
            serde_json::to_value(get_top_selling_products(state, limit.as_ref()))?
        }
        Request::GetSalesAnalytics { start_date, end_date } => {
            serde_json::to_value(get_sales_analytics(state, &start_date, &end_date))?
        }
        Request::PlaceOrder { input } => serde_json::to_value(place_order(state, input)?)?,
    };
    Ok(payload)
}

/// Parses a raw JSON request, runs it and wraps the outcome in an [`AppResponse`].
pub fn execute_json(state: &AppDbState, raw: &str) -> AppResponse {
    let request: Request = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => return AppResponse::BadRequest(format!("Invalid request: {e}")),
    };

    match execute(state, request).and_then(|payload| Ok(serde_json::to_string(&payload)?)) {
        Ok(json) => AppResponse::Ok(json),
        Err(e) => e,
    }
}

/// Accepts any integral JSON number, saturating at `i64::MAX`; everything
/// else is a validation failure.
pub fn parse_limit(limit: Option<&JsonValue>) -> Result<i64, AnalyticsError> {
    match limit {
        None | Some(JsonValue::Null) => Ok(DEFAULT_TOP_LIMIT),
        // integers past i64::MAX saturate; they cap nothing either way
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| AnalyticsError::validation(format!("Limit must be an integer, got {n}"))),
        Some(other) => Err(AnalyticsError::validation(format!(
            "Limit must be an integer, got {other}"
        ))),
    }
}
