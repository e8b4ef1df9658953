use uuid::Uuid;

use crate::domain::errors::{DomainError, OrderOperation};
use crate::domain::item_builder::OrderItemBuilder;
use crate::domain::lifecycle::LifecycleStage;
use crate::domain::order::{sum_money, OrderItemRequest, OrderView};
use crate::domain::ports::{OrderStore, OrderTransaction};
use crate::domain::stock::ProductStock;

use super::read_cache::{order_key, ReadCache, ALL_ORDERS_KEY};

/// Order lifecycle: every create, update and delete runs in one store
/// transaction, so stock reservations and order rows change together or not
/// at all. Reads go through the [`ReadCache`].
pub struct OrderService<S> {
    store: S,
    cache: ReadCache,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S, cache: ReadCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_all_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        self.cache
            .remember(ALL_ORDERS_KEY, || self.store.list_orders())
    }

    pub fn get_order(&self, order_id: Uuid) -> Result<OrderView, DomainError> {
        self.cache.remember(&order_key(order_id), || {
            self.store
                .find_order(order_id)?
                .ok_or(DomainError::OrderNotFound)
        })
    }

    pub fn create_order(
        &self,
        customer_id: Uuid,
        items: &[OrderItemRequest],
    ) -> Result<OrderView, DomainError> {
        let mut stage = LifecycleStage::Started;
        let result = self.store.transaction(|tx| {
            if !tx.customer_exists(customer_id)? {
                return Err(DomainError::CustomerNotFound(customer_id));
            }
            let order_id = tx.insert_order(customer_id)?;
            replace_items(tx, order_id, items, &mut stage)
        });

        let order = settle(OrderOperation::Create, None, stage, result)?;
        self.cache.invalidate_order(order.id);
        Ok(order)
    }

    /// Replaces the whole item set of an order. Stock held by the old items is
    /// returned before the new items are validated, all in one transaction.
    pub fn update_order(
        &self,
        order_id: Uuid,
        items: &[OrderItemRequest],
    ) -> Result<OrderView, DomainError> {
        let mut stage = LifecycleStage::Started;
        let result = self.store.transaction(|tx| {
            if !tx.lock_order(order_id)? {
                return Err(DomainError::OrderNotFound);
            }
            restore_items(tx, order_id, items)?;
            replace_items(tx, order_id, items, &mut stage)
        });

        let order = settle(OrderOperation::Update, Some(order_id), stage, result)?;
        self.cache.invalidate_order(order_id);
        Ok(order)
    }

    pub fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        let mut stage = LifecycleStage::Started;
        let result = self.store.transaction(|tx| {
            if !tx.lock_order(order_id)? {
                return Err(DomainError::OrderNotFound);
            }
            restore_items(tx, order_id, &[])?;
            stage.advance(LifecycleStage::ItemsPrepared);
            tx.soft_delete_order(order_id)?;
            stage.advance(LifecycleStage::Persisted);
            Ok(())
        });

        settle(OrderOperation::Delete, Some(order_id), stage, result)?;
        self.cache.invalidate_order(order_id);
        Ok(())
    }
}

/// Gives back the stock held by an order's live items and retires them.
///
/// The products of the old items and of `incoming` are locked in one batch
/// first, so an update takes all of its product locks in id order.
fn restore_items(
    tx: &mut dyn OrderTransaction,
    order_id: Uuid,
    incoming: &[OrderItemRequest],
) -> Result<(), DomainError> {
    let held = tx.live_items(order_id)?;
    let ids: Vec<Uuid> = held
        .iter()
        .map(|line| line.product_id)
        .chain(incoming.iter().map(|item| item.product_id))
        .collect();
    tx.lock_products(&ids)?;

    for line in held {
        ProductStock::increase(tx, line.product_id, line.quantity)?;
    }
    tx.soft_delete_items(order_id)
}

fn replace_items(
    tx: &mut dyn OrderTransaction,
    order_id: Uuid,
    items: &[OrderItemRequest],
    stage: &mut LifecycleStage,
) -> Result<OrderView, DomainError> {
    let lines = OrderItemBuilder::build(tx, items)?;
    stage.advance(LifecycleStage::ItemsPrepared);

    tx.insert_items(order_id, &lines)?;
    tx.set_total(order_id, &sum_money(lines.iter().map(|line| &line.total)))?;
    stage.advance(LifecycleStage::Persisted);

    tx.load_order(order_id)?.ok_or_else(|| {
        DomainError::Internal(format!("order {order_id} vanished before commit"))
    })
}

fn settle<T>(
    operation: OrderOperation,
    order_id: Option<Uuid>,
    mut stage: LifecycleStage,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match result {
        Ok(value) => {
            stage.advance(LifecycleStage::Committed);
            log::info!("Order {} {}", operation, stage);
            Ok(value)
        }
        Err(e) => {
            let reached = stage;
            stage.advance(LifecycleStage::RolledBack);
            if e.is_business_rule() {
                log::warn!("Order {} {} after stage {}: {}", operation, stage, reached, e);
            } else {
                log::error!("Order {} {} after stage {}: {}", operation, stage, reached, e);
            }
            Err(e.wrap_mutation(operation, order_id))
        }
    }
}
