//! Execution gateway trait definition.

use crate::error::BrokerError;
use crate::types::{Account, OrderId, PendingOrder};
use async_trait::async_trait;

/// Accepts finished orders and cancellations, and owns the account ledger.
///
/// The pipeline only ever reads an account snapshot; fills reported by the
/// gateway are the sole source of account changes.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Get a snapshot of the account, including pending orders.
    async fn account(&self) -> Result<Account, BrokerError>;

    /// Submit a finalized order.
    ///
    /// # Returns
    /// The id under which the order rests in the pending-order book
    async fn submit_order(&self, order: PendingOrder) -> Result<OrderId, BrokerError>;

    /// Cancel a previously submitted, unfilled order.
    async fn cancel_order(&self, id: OrderId) -> Result<(), BrokerError>;

    /// Get the gateway name.
    fn name(&self) -> &str;
}
