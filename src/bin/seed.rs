//! # Development seed data
//!
//! Inserts a fixed set of customers and products, then places three sample
//! orders through the regular order lifecycle so stock levels stay
//! consistent with the orders.
//!
//! ## Usage
//! ```bash
//! DATABASE_URL=postgres://... cargo run --bin seed
//! ```
//!
//! Running it again is harmless: rows with the fixed ids are skipped and the
//! sample orders are only placed into an empty `orders` table.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use diesel::prelude::*;
use dotenvy::dotenv;
use uuid::Uuid;

use order_management::application::order_service::OrderService;
use order_management::application::read_cache::ReadCache;
use order_management::config::AppConfig;
use order_management::domain::order::OrderItemRequest;
use order_management::infrastructure::models::{NewCustomerRow, NewProductRow};
use order_management::infrastructure::order_store::DieselOrderStore;
use order_management::schema::{customers, orders, products};
use order_management::{create_pool, run_migrations};

type SeedError = Box<dyn std::error::Error + Send + Sync>;

/// (id, name, since, revenue)
const CUSTOMERS: &[(u128, &str, &str, &str)] = &[
    (1, "Türker Jöntürk", "2014-06-28", "492.12"),
    (2, "Kaptan Devopuz", "2015-01-15", "1505.95"),
    (3, "İsa Sonuyumaz", "2016-02-11", "0.00"),
];

/// (id, name, category, price, stock)
const PRODUCTS: &[(u128, &str, i32, &str, i32)] = &[
    (100, "Black&Decker A7062 40 Parça Cırcırlı Tornavida Seti", 1, "120.75", 50),
    (101, "Reko Mini Tamir Hassas Tornavida Seti 32'li", 1, "49.50", 20),
    (102, "Viko Karre Anahtar - Beyaz", 2, "11.28", 100),
    (103, "Legrand Salbei Anahtar, Alüminyum", 2, "22.80", 40),
    (104, "Schneider Asfora Beyaz Komütatör", 2, "12.95", 40),
];

/// (customer, [(product, quantity)])
const ORDERS: &[(u128, &[(u128, i32)])] = &[
    (1, &[(102, 10)]),
    (2, &[(101, 2), (100, 1)]),
    (3, &[(102, 6), (100, 10)]),
];

fn main() -> Result<(), SeedError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let mut conn = pool.get()?;

    let new_customers = CUSTOMERS
        .iter()
        .map(|(id, name, since, revenue)| -> Result<NewCustomerRow, SeedError> {
            Ok(NewCustomerRow {
                id: Uuid::from_u128(*id),
                name: name.to_string(),
                since: NaiveDate::from_str(since)?,
                revenue: BigDecimal::from_str(revenue)?,
            })
        })
        .collect::<Result<Vec<_>, SeedError>>()?;
    let inserted = diesel::insert_into(customers::table)
        .values(&new_customers)
        .on_conflict_do_nothing()
        .execute(&mut conn)?;
    log::info!("Seeded {} customers", inserted);

    let new_products = PRODUCTS
        .iter()
        .map(|(id, name, category_id, price, stock)| -> Result<NewProductRow, SeedError> {
            Ok(NewProductRow {
                id: Uuid::from_u128(*id),
                name: name.to_string(),
                category_id: *category_id,
                price: BigDecimal::from_str(price)?,
                stock: *stock,
            })
        })
        .collect::<Result<Vec<_>, SeedError>>()?;
    let inserted = diesel::insert_into(products::table)
        .values(&new_products)
        .on_conflict_do_nothing()
        .execute(&mut conn)?;
    log::info!("Seeded {} products", inserted);

    let existing: i64 = orders::table.count().get_result(&mut conn)?;
    if existing > 0 {
        log::info!("{} orders already present, skipping sample orders", existing);
        return Ok(());
    }

    let service = OrderService::new(DieselOrderStore::new(pool.clone()), ReadCache::disabled());
    for (customer, lines) in ORDERS {
        let items: Vec<OrderItemRequest> = lines
            .iter()
            .map(|(product, quantity)| OrderItemRequest {
                product_id: Uuid::from_u128(*product),
                quantity: *quantity,
            })
            .collect();
        let order = service.create_order(Uuid::from_u128(*customer), &items)?;
        log::info!("Placed sample order {} with total {}", order.id, order.total);
    }

    Ok(())
}
