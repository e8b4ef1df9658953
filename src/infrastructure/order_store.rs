use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{DiscountLine, OrderView, PricedLine, Product, ReservedLine};
use crate::domain::ports::{OrderStore, OrderTransaction};
use crate::schema::{customers, order_items, orders, products};

use super::models::{
    CustomerRow, NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow, ProductRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Eager loading ─────────────────────────────────────────────────────────────

fn assemble(
    order: OrderRow,
    customer: CustomerRow,
    items: Vec<(OrderItemRow, ProductRow)>,
) -> OrderView {
    OrderView {
        id: order.id,
        customer_id: order.customer_id,
        customer: customer.into(),
        total: order.total,
        created_at: order.created_at,
        items: items
            .into_iter()
            .map(|(item, product)| item.into_view(product))
            .collect(),
    }
}

fn load_order_view(conn: &mut PgConnection, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
    let order = orders::table
        .filter(orders::id.eq(order_id))
        .filter(orders::deleted_at.is_null())
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let customer = customers::table
        .find(order.customer_id)
        .select(CustomerRow::as_select())
        .first(conn)?;

    let items = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq(order.id))
        .filter(order_items::deleted_at.is_null())
        .order(order_items::position.asc())
        .select((OrderItemRow::as_select(), ProductRow::as_select()))
        .load::<(OrderItemRow, ProductRow)>(conn)?;

    Ok(Some(assemble(order, customer, items)))
}

/// Loads every live order with its relations in three queries.
fn load_all_order_views(conn: &mut PgConnection) -> Result<Vec<OrderView>, DomainError> {
    let order_rows = orders::table
        .filter(orders::deleted_at.is_null())
        .order(orders::created_at.desc())
        .select(OrderRow::as_select())
        .load(conn)?;

    if order_rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = order_rows.iter().map(|o| o.id).collect();
    let customer_ids: Vec<Uuid> = order_rows.iter().map(|o| o.customer_id).collect();

    let customers_by_id: HashMap<Uuid, CustomerRow> = customers::table
        .filter(customers::id.eq_any(&customer_ids))
        .select(CustomerRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<(OrderItemRow, ProductRow)>> = HashMap::new();
    let rows = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq_any(&order_ids))
        .filter(order_items::deleted_at.is_null())
        .order((order_items::order_id.asc(), order_items::position.asc()))
        .select((OrderItemRow::as_select(), ProductRow::as_select()))
        .load::<(OrderItemRow, ProductRow)>(conn)?;
    for (item, product) in rows {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push((item, product));
    }

    order_rows
        .into_iter()
        .map(|order| {
            let customer = customers_by_id
                .get(&order.customer_id)
                .cloned()
                .ok_or_else(|| {
                    DomainError::Internal(format!(
                        "customer {} of order {} is missing",
                        order.customer_id, order.id
                    ))
                })?;
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            Ok(assemble(order, customer, items))
        })
        .collect()
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for DieselOrderStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTransaction) -> Result<T, DomainError>,
    {
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<_, DomainError, _>(|conn| work(&mut DieselTransaction { conn }))
    }

    fn find_order(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order_view(&mut conn, order_id)
    }

    fn list_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<_, DomainError, _>(|conn| load_all_order_views(conn))
    }

    fn discount_lines(&self, order_id: Uuid) -> Result<Option<Vec<DiscountLine>>, DomainError> {
        let mut conn = self.pool.get()?;

        let live = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::deleted_at.is_null())
            .select(orders::id)
            .first::<Uuid>(&mut conn)
            .optional()?;
        if live.is_none() {
            return Ok(None);
        }

        let rows = order_items::table
            .inner_join(products::table)
            .filter(order_items::order_id.eq(order_id))
            .filter(order_items::deleted_at.is_null())
            .order(order_items::position.asc())
            .select((products::category_id, order_items::quantity, order_items::total))
            .load::<(i32, i32, BigDecimal)>(&mut conn)?;

        Ok(Some(
            rows.into_iter()
                .map(|(category_id, quantity, total)| DiscountLine {
                    category_id,
                    quantity,
                    total,
                })
                .collect(),
        ))
    }
}

/// An open PostgreSQL transaction. Rows read through it are locked with
/// `FOR UPDATE` until commit or rollback.
struct DieselTransaction<'c> {
    conn: &'c mut PgConnection,
}

impl OrderTransaction for DieselTransaction<'_> {
    fn customer_exists(&mut self, customer_id: Uuid) -> Result<bool, DomainError> {
        let found = customers::table
            .filter(customers::id.eq(customer_id))
            .filter(customers::deleted_at.is_null())
            .select(customers::id)
            .first::<Uuid>(self.conn)
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_order(&mut self, customer_id: Uuid) -> Result<Uuid, DomainError> {
        let order_id = Uuid::new_v4();
        diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: order_id,
                customer_id,
                total: BigDecimal::from(0),
            })
            .execute(self.conn)?;
        Ok(order_id)
    }

    fn lock_order(&mut self, order_id: Uuid) -> Result<bool, DomainError> {
        let locked = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::deleted_at.is_null())
            .select(orders::id)
            .for_update()
            .get_result::<Uuid>(self.conn)
            .optional()?;
        Ok(locked.is_some())
    }

    fn live_items(&mut self, order_id: Uuid) -> Result<Vec<ReservedLine>, DomainError> {
        let rows = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .filter(order_items::deleted_at.is_null())
            .order(order_items::position.asc())
            .select((order_items::product_id, order_items::quantity))
            .load::<(Uuid, i32)>(self.conn)?;
        Ok(rows
            .into_iter()
            .map(|(product_id, quantity)| ReservedLine {
                product_id,
                quantity,
            })
            .collect())
    }

    fn lock_products(&mut self, product_ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        // Row locks are taken in ORDER BY order, so every transaction acquires
        // them in the same sequence.
        let rows = products::table
            .filter(products::id.eq_any(product_ids))
            .order(products::id.asc())
            .select(ProductRow::as_select())
            .for_update()
            .load::<ProductRow>(self.conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, DomainError> {
        let updated = diesel::update(
            products::table
                .filter(products::id.eq(product_id))
                .filter(products::stock.ge(quantity)),
        )
        .set((
            products::stock.eq(products::stock - quantity),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(self.conn)?;
        Ok(updated == 1)
    }

    fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let updated = diesel::update(products::table.filter(products::id.eq(product_id)))
            .set((
                products::stock.eq(products::stock + quantity),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(DomainError::ProductNotFound(product_id));
        }
        Ok(())
    }

    fn insert_items(&mut self, order_id: Uuid, lines: &[PricedLine]) -> Result<(), DomainError> {
        let rows: Vec<NewOrderItemRow> = lines
            .iter()
            .zip(0..)
            .map(|(line, position)| NewOrderItemRow {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                position,
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                total: line.total.clone(),
            })
            .collect();
        diesel::insert_into(order_items::table)
            .values(&rows)
            .execute(self.conn)?;
        Ok(())
    }

    fn soft_delete_items(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        diesel::update(
            order_items::table
                .filter(order_items::order_id.eq(order_id))
                .filter(order_items::deleted_at.is_null()),
        )
        .set(order_items::deleted_at.eq(Some(Utc::now())))
        .execute(self.conn)?;
        Ok(())
    }

    fn set_total(&mut self, order_id: Uuid, total: &BigDecimal) -> Result<(), DomainError> {
        diesel::update(orders::table.filter(orders::id.eq(order_id)))
            .set((orders::total.eq(total), orders::updated_at.eq(Utc::now())))
            .execute(self.conn)?;
        Ok(())
    }

    fn soft_delete_order(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        let now = Utc::now();
        diesel::update(orders::table.filter(orders::id.eq(order_id)))
            .set((orders::deleted_at.eq(Some(now)), orders::updated_at.eq(now)))
            .execute(self.conn)?;
        Ok(())
    }

    fn load_order(&mut self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        load_order_view(self.conn, order_id)
    }
}
