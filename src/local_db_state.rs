//! LMDB-backed document store for orders, products and customers.
//!
//! One environment per [`AppDbState`], three named databases inside it.
//! Documents are stored as JSON keyed by their id, so a full scan yields
//! them in id order.

use std::fs;

use lmdb::{Cursor, Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::data_source::{OrderFilter, OrderSource, ProductSource};
use crate::order_date::is_storable;
use crate::order_model::{Customer, Order, PlaceOrderInput, Product};

const ORDERS_DB: &str = "orders";
const PRODUCTS_DB: &str = "products";
const CUSTOMERS_DB: &str = "customers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Orders,
    Products,
    Customers,
}

struct Handles {
    env: Environment,
    orders: Database,
    products: Database,
    customers: Database,
}

impl Handles {
    fn db(&self, collection: Collection) -> Database {
        match collection {
            Collection::Orders => self.orders,
            Collection::Products => self.products,
            Collection::Customers => self.customers,
        }
    }
}

pub struct AppDbState {
    config: StoreConfig,
    handles: Option<Handles>,
}

impl AppDbState {
    /// Opens (or creates) `<name>.lmdb/` with default settings.
    pub fn init(name: String) -> Result<Self, AppResponse> {
        Self::open(StoreConfig::new(name))
    }

    pub fn open(config: StoreConfig) -> Result<Self, AppResponse> {
        let handles = open_handles(&config)?;
        info!("Order store opened at {}", config.lmdb_dir().display());
        Ok(AppDbState { config, handles: Some(handles) })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.handles.is_some()
    }

    pub fn post_order(&self, order: Order) -> Result<Order, AppResponse> {
        if let Some(date) = order.order_date.filter(|date| !is_storable(date)) {
            return Err(AppResponse::ValidationError(format!(
                "orderDate {date} is outside the storable years 0000-9999"
            )));
        }
        self.put_doc(Collection::Orders, &order.id, &order)?;
        Ok(order)
    }

    /// Persists a new order built from `input`, `totalAmount` as sent.
    pub fn place_order(&self, input: PlaceOrderInput) -> Result<Order, AppResponse> {
        let order = Order::from_input(input);
        debug!("Placing order {} for customer {}", order.id, order.customer_id);
        self.post_order(order)
    }

    pub fn post_product(&self, product: Product) -> Result<Product, AppResponse> {
        self.put_doc(Collection::Products, &product.id, &product)?;
        Ok(product)
    }

    pub fn post_customer(&self, customer: Customer) -> Result<Customer, AppResponse> {
        self.put_doc(Collection::Customers, &customer.id, &customer)?;
        Ok(customer)
    }

    pub fn get_order_by_id(&self, id: &str) -> Result<Option<Order>, AppResponse> {
        self.get_doc(Collection::Orders, id)
    }

    pub fn get_product_by_id(&self, id: &str) -> Result<Option<Product>, AppResponse> {
        self.get_doc(Collection::Products, id)
    }

    pub fn get_customer_by_id(&self, id: &str) -> Result<Option<Customer>, AppResponse> {
        self.get_doc(Collection::Customers, id)
    }

    pub fn get_orders(&self) -> Result<Vec<Order>, AppResponse> {
        self.scan(Collection::Orders)
    }

    pub fn get_products(&self) -> Result<Vec<Product>, AppResponse> {
        self.scan(Collection::Products)
    }

    pub fn delete_order_by_id(&self, id: &str) -> Result<bool, AppResponse> {
        let handles = self.handles()?;
        let db = handles.db(Collection::Orders);
        let mut txn = handles.env.begin_rw_txn()?;

        match txn.del(db, &id, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => {
                txn.abort();
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Empties every collection and returns how many documents were removed.
    pub fn clear_all_records(&self) -> Result<usize, AppResponse> {
        let handles = self.handles()?;
        let mut txn = handles.env.begin_rw_txn()?;
        let mut removed = 0;

        for collection in [Collection::Orders, Collection::Products, Collection::Customers] {
            let db = handles.db(collection);
            {
                let mut cursor = txn.open_ro_cursor(db)?;
                let count = cursor.iter_start().count();
                removed += count;
            }
            txn.clear_db(db)?;
        }

        txn.commit()?;
        info!("Cleared {} documents from the order store", removed);
        Ok(removed)
    }

    /// Drops the current environment from disk and opens a fresh one under `name`.
    pub fn reset_database(&mut self, name: &str) -> Result<bool, AppResponse> {
        self.close_database()?;

        let old_dir = self.config.lmdb_dir();
        if old_dir.exists() {
            fs::remove_dir_all(&old_dir)?;
        }

        let mut config = self.config.clone();
        config.path = name.into();
        let new_dir = config.lmdb_dir();
        if new_dir.exists() {
            fs::remove_dir_all(&new_dir)?;
        }

        self.handles = Some(open_handles(&config)?);
        self.config = config;
        info!("Order store reset at {}", new_dir.display());
        Ok(true)
    }

    /// Flushes and releases the environment. Later calls fail with a database error.
    pub fn close_database(&mut self) -> Result<(), AppResponse> {
        match self.handles.take() {
            Some(handles) => {
                handles.env.sync(true)?;
                info!("Order store at {} closed", self.config.lmdb_dir().display());
            }
            None => warn!("close_database called on an already closed store"),
        }
        Ok(())
    }

    fn handles(&self) -> Result<&Handles, AppResponse> {
        self.handles
            .as_ref()
            .ok_or_else(|| AppResponse::DatabaseError("Database is closed".to_string()))
    }

    fn put_doc<T: Serialize>(&self, collection: Collection, id: &str, doc: &T) -> Result<(), AppResponse> {
        if id.is_empty() {
            return Err(AppResponse::ValidationError("Document id cannot be empty".to_string()));
        }

        let handles = self.handles()?;
        let json = serde_json::to_vec(doc)?;
        let mut txn = handles.env.begin_rw_txn()?;
        txn.put(handles.db(collection), &id, &json, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    fn get_doc<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<Option<T>, AppResponse> {
        if id.is_empty() {
            return Ok(None);
        }

        let handles = self.handles()?;
        let txn = handles.env.begin_ro_txn()?;
        let doc = match txn.get(handles.db(collection), &id) {
            Ok(bytes) => Some(serde_json::from_slice(bytes)?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(doc)
    }

    /// Full scan in key order. A document that no longer decodes is skipped
    /// so one bad record cannot hide the rest of the collection.
    fn scan<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, AppResponse> {
        let handles = self.handles()?;
        let txn = handles.env.begin_ro_txn()?;
        let mut docs = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(handles.db(collection))?;
            for (key, value) in cursor.iter_start() {
                match serde_json::from_slice(value) {
                    Ok(doc) => docs.push(doc),
                    Err(e) => warn!(
                        "Skipping undecodable {:?} document {}: {}",
                        collection,
                        String::from_utf8_lossy(key),
                        e
                    ),
                }
            }
        }
        txn.abort();
        Ok(docs)
    }
}

impl OrderSource for AppDbState {
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppResponse> {
        let mut orders = self.get_orders()?;
        orders.retain(|order| filter.matches(order));
        Ok(orders)
    }
}

impl ProductSource for AppDbState {
    fn product_by_id(&self, id: &str) -> Result<Option<Product>, AppResponse> {
        self.get_product_by_id(id)
    }
}

fn open_handles(config: &StoreConfig) -> Result<Handles, AppResponse> {
    let dir = config.lmdb_dir();
    fs::create_dir_all(&dir)?;

    let env = Environment::new()
        .set_max_dbs(3)
        .set_map_size(config.map_size)
        .set_max_readers(config.max_readers)
        .open(&dir)?;

    let orders = env.create_db(Some(ORDERS_DB), DatabaseFlags::empty())?;
    let products = env.create_db(Some(PRODUCTS_DB), DatabaseFlags::empty())?;
    let customers = env.create_db(Some(CUSTOMERS_DB), DatabaseFlags::empty())?;

    Ok(Handles { env, orders, products, customers })
}
