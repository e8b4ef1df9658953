//! In-memory `OrderStore` and `CacheStore` used by unit tests.
//!
//! The store copies its whole state when a transaction starts and swaps the
//! copy in only on success, so rollback behaves like the real database.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    Customer, DiscountLine, OrderItemView, OrderView, PricedLine, Product, ReservedLine,
};
use crate::domain::ports::{CacheError, CacheStore, OrderStore, OrderTransaction};

#[derive(Debug, Clone)]
struct OrderRecord {
    id: Uuid,
    customer_id: Uuid,
    total: BigDecimal,
    created_at: DateTime<Utc>,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct ItemRecord {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: BigDecimal,
    total: BigDecimal,
    deleted: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    customers: HashMap<Uuid, Customer>,
    products: HashMap<Uuid, Product>,
    orders: Vec<OrderRecord>,
    items: Vec<ItemRecord>,
}

impl MemoryState {
    fn view(&self, order_id: Uuid) -> Option<OrderView> {
        let order = self.orders.iter().find(|o| o.id == order_id && !o.deleted)?;
        let customer = self.customers.get(&order.customer_id)?.clone();
        let items = self
            .items
            .iter()
            .filter(|i| i.order_id == order_id && !i.deleted)
            .filter_map(|i| {
                let product = self.products.get(&i.product_id)?.clone();
                Some(OrderItemView {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.clone(),
                    total: i.total.clone(),
                    product,
                })
            })
            .collect();
        Some(OrderView {
            id: order.id,
            customer_id: order.customer_id,
            customer,
            total: order.total.clone(),
            created_at: order.created_at,
            items,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_item_inserts: AtomicBool,
    reads: AtomicUsize,
    lock_batches: Mutex<Vec<Vec<Uuid>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, name: &str) -> Customer {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            since: NaiveDate::from_ymd_opt(2014, 6, 28).expect("valid date"),
            revenue: BigDecimal::from(0),
        };
        self.lock().customers.insert(customer.id, customer.clone());
        customer
    }

    pub fn add_product(&self, name: &str, category_id: i32, price: &str, stock: i32) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category_id,
            price: BigDecimal::from_str(price).expect("valid price"),
            stock,
        };
        self.lock().products.insert(product.id, product.clone());
        product
    }

    pub fn stock_of(&self, product_id: Uuid) -> i32 {
        self.lock().products[&product_id].stock
    }

    pub fn live_order_count(&self) -> usize {
        self.lock().orders.iter().filter(|o| !o.deleted).count()
    }

    pub fn order_exists_including_deleted(&self, order_id: Uuid) -> bool {
        self.lock().orders.iter().any(|o| o.id == order_id)
    }

    /// Makes every later `insert_items` call fail with an internal error.
    pub fn fail_item_inserts(&self, fail: bool) {
        self.fail_item_inserts.store(fail, Ordering::SeqCst);
    }

    /// Product ids of every `lock_products` call, in the order they were
    /// locked.
    pub fn lock_batches(&self) -> Vec<Vec<Uuid>> {
        self.lock_batches.lock().expect("lock batch log").clone()
    }

    /// Number of read-path calls that reached the store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn run<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTransaction) -> Result<T, DomainError>,
    {
        self.transaction(work)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock")
    }
}

impl OrderStore for MemoryStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTransaction) -> Result<T, DomainError>,
    {
        let mut state = self.lock();
        let mut working = state.clone();
        let mut tx = MemoryTransaction {
            state: &mut working,
            fail_item_inserts: self.fail_item_inserts.load(Ordering::SeqCst),
            lock_batches: Vec::new(),
        };
        let result = work(&mut tx);
        let batches = std::mem::take(&mut tx.lock_batches);
        self.lock_batches
            .lock()
            .expect("lock batch log")
            .extend(batches);
        let result = result?;
        *state = working;
        Ok(result)
    }

    fn find_order(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().view(order_id))
    }

    fn list_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        Ok(state.orders.iter().filter_map(|o| state.view(o.id)).collect())
    }

    fn discount_lines(&self, order_id: Uuid) -> Result<Option<Vec<DiscountLine>>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        Ok(state.view(order_id).map(|view| {
            view.items
                .into_iter()
                .map(|item| DiscountLine {
                    category_id: item.product.category_id,
                    quantity: item.quantity,
                    total: item.total,
                })
                .collect()
        }))
    }
}

struct MemoryTransaction<'s> {
    state: &'s mut MemoryState,
    fail_item_inserts: bool,
    lock_batches: Vec<Vec<Uuid>>,
}

impl OrderTransaction for MemoryTransaction<'_> {
    fn customer_exists(&mut self, customer_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.state.customers.contains_key(&customer_id))
    }

    fn insert_order(&mut self, customer_id: Uuid) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        self.state.orders.push(OrderRecord {
            id,
            customer_id,
            total: BigDecimal::from(0),
            created_at: Utc::now(),
            deleted: false,
        });
        Ok(id)
    }

    fn lock_order(&mut self, order_id: Uuid) -> Result<bool, DomainError> {
        Ok(self
            .state
            .orders
            .iter()
            .any(|o| o.id == order_id && !o.deleted))
    }

    fn live_items(&mut self, order_id: Uuid) -> Result<Vec<ReservedLine>, DomainError> {
        Ok(self
            .state
            .items
            .iter()
            .filter(|i| i.order_id == order_id && !i.deleted)
            .map(|i| ReservedLine {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect())
    }

    fn lock_products(&mut self, product_ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut ids = product_ids.to_vec();
        ids.sort();
        ids.dedup();
        let products = ids
            .iter()
            .filter_map(|id| self.state.products.get(id).cloned())
            .collect();
        self.lock_batches.push(ids);
        Ok(products)
    }

    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, DomainError> {
        match self.state.products.get_mut(&product_id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let product = self
            .state
            .products
            .get_mut(&product_id)
            .ok_or(DomainError::ProductNotFound(product_id))?;
        product.stock += quantity;
        Ok(())
    }

    fn insert_items(&mut self, order_id: Uuid, lines: &[PricedLine]) -> Result<(), DomainError> {
        if self.fail_item_inserts {
            return Err(DomainError::Internal("order_items insert failed".to_string()));
        }
        for line in lines {
            self.state.items.push(ItemRecord {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                total: line.total.clone(),
                deleted: false,
            });
        }
        Ok(())
    }

    fn soft_delete_items(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        self.state
            .items
            .iter_mut()
            .filter(|i| i.order_id == order_id)
            .for_each(|i| i.deleted = true);
        Ok(())
    }

    fn set_total(&mut self, order_id: Uuid, total: &BigDecimal) -> Result<(), DomainError> {
        let order = self
            .state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(DomainError::OrderNotFound)?;
        order.total = total.clone();
        Ok(())
    }

    fn soft_delete_order(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        let order = self
            .state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(DomainError::OrderNotFound)?;
        order.deleted = true;
        Ok(())
    }

    fn load_order(&mut self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.state.view(order_id))
    }
}

/// A cache tier whose reads and writes can be switched to fail.
pub struct MemoryCache {
    name: String,
    entries: Mutex<HashMap<String, String>>,
    failing_reads: AtomicBool,
    failing_writes: AtomicBool,
}

impl MemoryCache {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(HashMap::new()),
            failing_reads: AtomicBool::new(false),
            failing_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().expect("cache lock").contains_key(key)
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), value.to_string());
    }
}

impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(CacheError::new(&self.name, "connection refused"));
        }
        Ok(self.entries.lock().expect("cache lock").get(key).cloned())
    }

    fn put(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(CacheError::new(&self.name, "write rejected"));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn forget(&self, keys: &[String]) -> Result<(), CacheError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(CacheError::new(&self.name, "delete rejected"));
        }
        let mut entries = self.entries.lock().expect("cache lock");
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
