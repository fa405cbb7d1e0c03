//! Seams between the gateway and the host shop.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::models::{Order, OrderStatus};

/// Read access to host orders.
#[async_trait]
pub trait OrderProvider: Send + Sync {
    async fn order(&self, order_id: u64) -> Result<Option<Order>>;
}

/// Order status transitions triggered by the gateway.
#[async_trait]
pub trait PaymentResultSink: Send + Sync {
    /// Complete the order, recording the gateway reference if there is one.
    async fn mark_paid(&self, order_id: u64, reference: Option<&str>) -> Result<()>;
    async fn mark_failed(&self, order_id: u64, note: &str) -> Result<()>;
    async fn mark_refunded(&self, order_id: u64, note: &str) -> Result<()>;
}

/// Pending invoice per order, kept until the order is paid.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn pending_transaction(&self, order_id: u64) -> Result<Option<String>>;
    async fn store_transaction(&self, order_id: u64, transaction_id: &str) -> Result<()>;
    async fn clear_transaction(&self, order_id: u64) -> Result<()>;
}

/// Process-local order book implementing every seam.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<DashMap<u64, Order>>,
    transactions: Arc<DashMap<u64, String>>,
    notes: Arc<DashMap<u64, Vec<String>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new order. Ids are unique.
    pub fn insert(&self, order: Order) -> Result<()> {
        match self.orders.entry(order.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(anyhow!("order {} already exists", order.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(())
            }
        }
    }

    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Status notes left on the order, oldest first.
    pub fn notes(&self, order_id: u64) -> Vec<String> {
        self.notes
            .get(&order_id)
            .map(|notes| notes.clone())
            .unwrap_or_default()
    }

    fn transition(&self, order_id: u64, status: OrderStatus, note: &str) -> Result<()> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| anyhow!("order {} not found", order_id))?;
        order.status = status;
        drop(order);

        self.notes
            .entry(order_id)
            .or_default()
            .push(note.to_string());

        tracing::info!(order_id, status = ?status, note, "Order status updated");
        Ok(())
    }
}

#[async_trait]
impl OrderProvider for InMemoryOrderStore {
    async fn order(&self, order_id: u64) -> Result<Option<Order>> {
        Ok(self.orders.get(&order_id).map(|order| order.clone()))
    }
}

#[async_trait]
impl PaymentResultSink for InMemoryOrderStore {
    async fn mark_paid(&self, order_id: u64, reference: Option<&str>) -> Result<()> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| anyhow!("order {} not found", order_id))?;
        order.status = OrderStatus::Complete;
        if let Some(reference) = reference {
            order.payment_reference = Some(reference.to_string());
        }
        drop(order);

        self.notes
            .entry(order_id)
            .or_default()
            .push("Payment complete".to_string());

        tracing::info!(order_id, reference = ?reference, "Order payment complete");
        Ok(())
    }

    async fn mark_failed(&self, order_id: u64, note: &str) -> Result<()> {
        self.transition(order_id, OrderStatus::Failed, note)
    }

    async fn mark_refunded(&self, order_id: u64, note: &str) -> Result<()> {
        self.transition(order_id, OrderStatus::Refunded, note)
    }
}

#[async_trait]
impl TransactionStore for InMemoryOrderStore {
    async fn pending_transaction(&self, order_id: u64) -> Result<Option<String>> {
        Ok(self.transactions.get(&order_id).map(|tx| tx.clone()))
    }

    async fn store_transaction(&self, order_id: u64, transaction_id: &str) -> Result<()> {
        self.transactions.insert(order_id, transaction_id.to_string());
        Ok(())
    }

    async fn clear_transaction(&self, order_id: u64) -> Result<()> {
        self.transactions.remove(&order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(id: u64) -> Order {
        Order {
            id,
            amount: 15000,
            currency: "MDL".to_string(),
            billing_email: "e@e.e".to_string(),
            created_at: Utc::now(),
            status_link: format!("https://shop.md/checkout/{}", id),
            cancel_url: "https://shop.md/cart".to_string(),
            return_url: format!("https://shop.md/thanks/{}", id),
            status: OrderStatus::Pending,
            payment_reference: None,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let store = InMemoryOrderStore::new();
        store.insert(order(1)).unwrap();
        assert!(store.insert(order(1)).is_err());
        assert!(store.contains(1));
    }

    #[tokio::test]
    async fn mark_paid_records_reference() {
        let store = InMemoryOrderStore::new();
        store.insert(order(7)).unwrap();

        store.mark_paid(7, Some("tx-7")).await.unwrap();

        let paid = store.order(7).await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::Complete);
        assert_eq!(paid.payment_reference.as_deref(), Some("tx-7"));
        assert_eq!(store.notes(7), vec!["Payment complete".to_string()]);
    }

    #[tokio::test]
    async fn transitions_unknown_order_fail() {
        let store = InMemoryOrderStore::new();
        assert!(store.mark_failed(404, "Ошибка оплаты").await.is_err());
        assert!(store.mark_refunded(404, "Платеж возвращён").await.is_err());
    }

    #[tokio::test]
    async fn transaction_ids_are_stored_and_cleared() {
        let store = InMemoryOrderStore::new();
        store.store_transaction(3, "tx-3").await.unwrap();
        assert_eq!(
            store.pending_transaction(3).await.unwrap().as_deref(),
            Some("tx-3")
        );

        store.clear_transaction(3).await.unwrap();
        assert_eq!(store.pending_transaction(3).await.unwrap(), None);
    }
}
