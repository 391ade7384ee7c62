//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: Uuid, user_id: Uuid, total_amount: Decimal },
    OrderStatusChanged { order_id: Uuid, status: OrderStatus },
    MessageReceived { message_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "storefront.orders.placed",
            Self::OrderStatusChanged { .. } => "storefront.orders.status_changed",
            Self::MessageReceived { .. } => "storefront.messages.received",
        }
    }
}
