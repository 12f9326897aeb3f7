use serde::{Deserialize, Serialize};

use crate::db_types::{Complaint, Conversation, Message, Order, OrderStatusType};

/// Emitted after a consumer's order has been stored. The owning supplier's staff typically want to hear about this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted after a supplier accepts an order and the stock has been committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAcceptedEvent {
    pub order: Order,
}

impl OrderAcceptedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an order leaves the pending state without being fulfilled: rejected by the supplier or cancelled by
/// the consumer. The `status` field records which.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}

/// Emitted after a chat message has been stored and its conversation touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSentEvent {
    pub conversation: Conversation,
    pub message: Message,
}

impl MessageSentEvent {
    pub fn new(conversation: Conversation, message: Message) -> Self {
        Self { conversation, message }
    }
}

/// Emitted after a complaint escalation has committed, carrying the system message that was appended to the linked
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintEscalatedEvent {
    pub complaint: Complaint,
    pub message: Message,
}

impl ComplaintEscalatedEvent {
    pub fn new(complaint: Complaint, message: Message) -> Self {
        Self { complaint, message }
    }
}
