//! # Order Analytics Core
//!
//! An embedded order-management store built on LMDB, with three fail-soft
//! sales reports computed over it and a C-compatible surface for hosts that
//! talk JSON across FFI.
//!
//! ## Reports
//!
//! - **Customer spending**: total, average and last order date over a
//!   customer's completed, shipped and delivered orders
//! - **Top-selling products**: quantity sold per product over completed and
//!   shipped orders, joined to product names
//! - **Sales analytics**: revenue and order count of completed orders inside
//!   an inclusive UTC day window, with revenue per product category
//!
//! The reports never fail. Bad input or an unreadable store produces the
//! report's zero value and a log line.
//!
//! ## Quick Start
//!
//! ```no_run
//! use order_analytics_core::{create_db, execute_request, free_response};
//! use std::ffi::CString;
//!
//! let db_name = CString::new("shop").unwrap();
//! let db_state = create_db(db_name.as_ptr());
//!
//! let request = CString::new(
//!     r#"{"operation":"getTopSellingProducts","variables":{"limit":5}}"#,
//! ).unwrap();
//! let response = execute_request(db_state, request.as_ptr());
//! free_response(response);
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_db`] / [`create_db_from_env`] - Open the store
//! - [`get_customer_spending`] - Customer lifetime spend
//! - [`get_top_selling_products`] - Best sellers by quantity
//! - [`get_sales_analytics`] - Windowed revenue and category breakdown
//! - [`place_order`] - Persist a new order
//! - [`post_product`] / [`post_customer`] - Insert or replace catalog and customer documents
//! - [`execute_request`] - Run any operation from a JSON envelope
//! - [`clear_all_records`] - Empty every collection
//! - [`reset_database`] - Recreate the store under a new name
//! - [`close_database`] - Explicit connection cleanup
//! - [`free_response`] / [`destroy_db`] - Release memory handed out by this library

pub mod analytics;
pub mod analytics_error;
pub mod app_response;
pub mod config;
pub mod data_source;
pub mod local_db_state;
pub mod order_date;
pub mod order_model;
pub mod resolvers;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::local_db_state::AppDbState;
use crate::order_model::{Customer, PlaceOrderInput, Product};

/// Opens (or creates) the store at `<name>.lmdb/`.
///
/// The environment holds three databases: `orders`, `products` and `customers`.
///
/// # Parameters
///
/// * `name` - Null-terminated C string with the store name or path, without the `.lmdb` suffix
///
/// # Returns
///
/// Returns a pointer to the [`AppDbState`] on success, or a null pointer on failure.
/// The pointer must eventually be passed to [`destroy_db`].
///
/// # Safety
///
/// `name` must be null or point to a valid null-terminated string that stays
/// alive for the duration of the call.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use order_analytics_core::{create_db, destroy_db};
///
/// let name = CString::new("shop").unwrap();
/// let db_state = create_db(name.as_ptr());
///
/// if !db_state.is_null() {
///     destroy_db(db_state);
/// }
/// ```
///
/// # Errors
///
/// Returns a null pointer if:
/// - `name` is null
/// - `name` is not valid UTF-8
/// - The LMDB environment cannot be created or opened
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_db(name: *const c_char) -> *mut AppDbState {
    if name.is_null() {
        warn!("Null name pointer passed to create_db");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_state(StoreConfig::new(name_str))
}

/// Opens the store described by `ORDER_STORE_*` environment variables.
///
/// A `.env` file in the working directory is loaded first when present.
/// See [`StoreConfig::from_env`] for the variables read.
///
/// # Returns
///
/// Returns a pointer to the [`AppDbState`], or a null pointer when a variable
/// is malformed or the store cannot be opened.
#[no_mangle]
pub extern "C" fn create_db_from_env() -> *mut AppDbState {
    match StoreConfig::from_env() {
        Ok(config) => open_state(config),
        Err(e) => {
            warn!("❌ Invalid store configuration: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_state(config: StoreConfig) -> *mut AppDbState {
    let lmdb_dir = config.lmdb_dir();
    info!("Attempting to create/open order store at: {}", lmdb_dir.display());

    match AppDbState::open(config) {
        Ok(state) => {
            info!("✅ Order store initialized successfully");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("❌ Failed to initialize order store: {e}");
            warn!("Attempted path: {}", lmdb_dir.display());
            std::ptr::null_mut()
        }
    }
}

/// Spending summary for one customer.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `customer_id` - Null-terminated C string with the customer id
///
/// # Returns
///
/// A JSON `AppResponse` C string. It is always `Ok` with a summary once the
/// pointers are valid; unknown customers and store failures both yield zeros
/// and a `null` last order date. Free it with [`free_response`].
///
/// # Safety
///
/// `state` must be null or a live pointer from [`create_db`]. `customer_id`
/// must be null or a valid null-terminated string.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use order_analytics_core::{create_db, free_response, get_customer_spending};
///
/// let db_name = CString::new("shop").unwrap();
/// let db_state = create_db(db_name.as_ptr());
///
/// let customer = CString::new("c1").unwrap();
/// let result = get_customer_spending(db_state, customer.as_ptr());
/// free_response(result);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_customer_spending(state: *mut AppDbState, customer_id: *const c_char) -> *const c_char {
    let state = match state_ref(state, "get_customer_spending") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let customer_id = match c_ptr_to_string(customer_id, "customer id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    payload_to_c_string(&resolvers::get_customer_spending(state, &customer_id))
}

/// Up to `limit` best sellers by quantity sold.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `limit` - Maximum number of products; below 1 yields an empty list
///
/// # Returns
///
/// A JSON `AppResponse` C string wrapping the ranked list. Free it with [`free_response`].
///
/// # Safety
///
/// `state` must be null or a live pointer from [`create_db`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_top_selling_products(state: *mut AppDbState, limit: i64) -> *const c_char {
    let state = match state_ref(state, "get_top_selling_products") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let limit = JsonValue::from(limit);
    payload_to_c_string(&resolvers::get_top_selling_products(state, Some(&limit)))
}

/// Sales report between two `YYYY-MM-DD` days, both inclusive.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `start_date` - Null-terminated `YYYY-MM-DD`, read as 00:00:00 UTC
/// * `end_date` - Null-terminated `YYYY-MM-DD`, read as 23:59:59 UTC
///
/// # Returns
///
/// A JSON `AppResponse` C string wrapping the report. Malformed dates produce
/// the zero report rather than an error. Free it with [`free_response`].
///
/// # Safety
///
/// `state` must be null or a live pointer from [`create_db`]. Both date
/// pointers must be null or valid null-terminated strings.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use order_analytics_core::{create_db, free_response, get_sales_analytics};
///
/// let db_name = CString::new("shop").unwrap();
/// let db_state = create_db(db_name.as_ptr());
///
/// let start = CString::new("2024-01-01").unwrap();
/// let end = CString::new("2024-01-31").unwrap();
/// let result = get_sales_analytics(db_state, start.as_ptr(), end.as_ptr());
/// free_response(result);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_sales_analytics(
    state: *mut AppDbState,
    start_date: *const c_char,
    end_date: *const c_char,
) -> *const c_char {
    let state = match state_ref(state, "get_sales_analytics") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let start_date = match c_ptr_to_string(start_date, "start date") {
        Ok(date) => date,
        Err(err) => return err,
    };
    let end_date = match c_ptr_to_string(end_date, "end date") {
        Ok(date) => date,
        Err(err) => return err,
    };

    payload_to_c_string(&resolvers::get_sales_analytics(state, &start_date, &end_date))
}

/// Persists a new order from a `PlaceOrderInput` JSON document and returns it
/// with its generated id.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `json_ptr` - Null-terminated C string with the order input
///
/// # Returns
///
/// A JSON `AppResponse` C string: `Ok` with the stored order, `SerializationError`
/// for malformed input (including an `orderDate` outside years 0000-9999), or
/// the store error. Free it with [`free_response`].
///
/// # Safety
///
/// `state` must be null or a live pointer from [`create_db`]. `json_ptr` must
/// be null or a valid null-terminated string.
///
/// # JSON Format
///
/// ```json
/// {
///   "customerId": "c1",
///   "products": [{"productId": "p1", "quantity": 2, "priceAtPurchase": 9.99}],
///   "totalAmount": 19.98,
///   "orderDate": "2024-01-05",
///   "status": "completed"
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn place_order(state: *mut AppDbState, json_ptr: *const c_char) -> *const c_char {
    let state = match state_ref(state, "place_order") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let input: PlaceOrderInput = match parse_json(json_ptr) {
        Ok(input) => input,
        Err(err) => return err,
    };

    match resolvers::place_order(state, input) {
        Ok(order) => payload_to_c_string(&order),
        Err(e) => response_to_c_string(&e),
    }
}

/// Inserts or replaces a product document.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `json_ptr` - Null-terminated JSON product, e.g. `{"_id":"p1","name":"Laptop","category":"electronics","price":999.0}`
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn post_product(state: *mut AppDbState, json_ptr: *const c_char) -> *const c_char {
    let state = match state_ref(state, "post_product") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let product: Product = match parse_json(json_ptr) {
        Ok(product) => product,
        Err(err) => return err,
    };

    match state.post_product(product) {
        Ok(product) => payload_to_c_string(&product),
        Err(e) => response_to_c_string(&e),
    }
}

/// Inserts or replaces a customer document.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `json_ptr` - Null-terminated JSON customer
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn post_customer(state: *mut AppDbState, json_ptr: *const c_char) -> *const c_char {
    let state = match state_ref(state, "post_customer") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let customer: Customer = match parse_json(json_ptr) {
        Ok(customer) => customer,
        Err(err) => return err,
    };

    match state.post_customer(customer) {
        Ok(customer) => payload_to_c_string(&customer),
        Err(e) => response_to_c_string(&e),
    }
}

/// Runs a `{"operation": ..., "variables": {...}}` request.
///
/// See [`resolvers::Request`] for the accepted operations.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_db`]
/// * `json_ptr` - Null-terminated C string with the request envelope
///
/// # Returns
///
/// A JSON `AppResponse` C string. An envelope that does not parse answers
/// `BadRequest`; otherwise the operation's own reply. Free it with [`free_response`].
///
/// # Safety
///
/// `state` must be null or a live pointer from [`create_db`]. `json_ptr` must
/// be null or a valid null-terminated string.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use order_analytics_core::{create_db, execute_request, free_response};
///
/// let db_name = CString::new("shop").unwrap();
/// let db_state = create_db(db_name.as_ptr());
///
/// let request = CString::new(r#"{"operation":"getCustomerSpending","variables":{"customerId":"c1"}}"#).unwrap();
/// let result = execute_request(db_state, request.as_ptr());
/// free_response(result);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn execute_request(state: *mut AppDbState, json_ptr: *const c_char) -> *const c_char {
    let state = match state_ref(state, "execute_request") {
        Ok(state) => state,
        Err(err) => return err,
    };

    let raw = match c_ptr_to_string(json_ptr, "request") {
        Ok(raw) => raw,
        Err(err) => return err,
    };

    response_to_c_string(&resolvers::execute_json(state, &raw))
}

/// Removes every order, product and customer; the store stays open.
///
/// # Parameters
///
/// * `db_state` - Pointer returned by [`create_db`]
///
/// # Returns
///
/// A JSON `AppResponse` C string reporting how many documents were removed.
///
/// # Safety
///
/// The db_state parameter must be null or a live pointer from [`create_db`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_all_records(db_state: *mut AppDbState) -> *const c_char {
    let db_state = match state_ref(db_state, "clear_all_records") {
        Ok(state) => state,
        Err(err) => return err,
    };

    match db_state.clear_all_records() {
        Ok(count) => {
            let success = AppResponse::Ok(format!("{count} records cleared successfully"));
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Resets the store to a clean state with a new name.
///
/// This operation:
/// 1. Closes the current environment
/// 2. Removes the existing `.lmdb` directory
/// 3. Opens an empty store under `name_ptr`
///
/// # Parameters
///
/// * `db_state` - Pointer returned by [`create_db`]
/// * `name_ptr` - Null-terminated C string with the new store name
///
/// # Returns
///
/// A JSON `AppResponse` C string indicating success or failure.
///
/// # Safety
///
/// Both parameters must be null or valid, and no other thread may be using
/// `db_state` during the call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_database(db_state: *mut AppDbState, name_ptr: *const c_char) -> *const c_char {
    if db_state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to reset_database".to_string());
        return response_to_c_string(&error);
    }

    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(error_ptr) => return error_ptr,
    };

    let db_state = unsafe { &mut *db_state };

    match db_state.reset_database(&name) {
        Ok(_) => {
            let success = AppResponse::Ok(format!("Database '{name}' was reset successfully"));
            response_to_c_string(&success)
        }
        Err(e) => {
            let error = AppResponse::DatabaseError(format!("Error resetting database: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Explicitly releases the LMDB environment.
///
/// Reports issued afterwards return their zero values; writes fail with a
/// database error. The state itself is still owned by the caller and must be
/// released with [`destroy_db`].
///
/// # Parameters
///
/// * `db_state` - Pointer returned by [`create_db`]
///
/// # Safety
///
/// The db_state parameter must be null or a live pointer, and no other thread
/// may be using it during the call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_database(db_state: *mut AppDbState) -> *const c_char {
    if db_state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_database".to_string());
        return response_to_c_string(&error);
    }

    let db_state = unsafe { &mut *db_state };

    match db_state.close_database() {
        Ok(_) => {
            let success = AppResponse::Ok("Database connection closed successfully".to_string());
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Frees a string returned by any function in this library.
///
/// # Safety
///
/// `ptr` must be null or a string returned by this library that has not been
/// freed yet.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Closes (if needed) and frees a state returned by [`create_db`].
///
/// # Safety
///
/// `db_state` must be null or a pointer from [`create_db`] /
/// [`create_db_from_env`] that is not used again afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn destroy_db(db_state: *mut AppDbState) {
    if db_state.is_null() {
        return;
    }

    let mut state = unsafe { Box::from_raw(db_state) };
    if state.is_open() {
        if let Err(e) = state.close_database() {
            warn!("Failed to close order store while destroying it: {e}");
        }
    }
}

fn state_ref<'a>(state: *mut AppDbState, caller: &str) -> Result<&'a AppDbState, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(state) => Ok(state),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(json_ptr: *const c_char) -> Result<T, *const c_char> {
    let json_str = c_ptr_to_string(json_ptr, "JSON")?;

    serde_json::from_str(&json_str).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Wraps a serializable payload in `AppResponse::Ok` and hands it to C.
fn payload_to_c_string<T: Serialize>(payload: &T) -> *const c_char {
    match serde_json::to_string(payload) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Serializes `response` to JSON and converts it to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// On failure the error is already encoded as an `AppResponse` C string,
/// ready to be returned to the FFI caller.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
