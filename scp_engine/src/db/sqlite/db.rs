//! `SqliteDatabase` is a concrete implementation of an ordering platform backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{complaints, conversations, messages, new_pool, orders, products};
use crate::{
    db_types::{
        Complaint,
        Conversation,
        Message,
        NewComplaint,
        NewMessage,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductPatch,
        StoredRole,
    },
    traits::{
        ChatGatewayDatabase,
        ChatGatewayError,
        OrderGatewayDatabase,
        OrderGatewayError,
        ESCALATION_MESSAGE,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: &str,
        patch: ProductPatch,
    ) -> Result<Option<Product>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product(product_id, patch, &mut conn).await?;
        Ok(product)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = orders::insert_order_header(&order, &mut tx).await?;
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let item = orders::insert_order_item(&stored.id, item, &mut tx).await?;
            items.push(item);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved with {} line items", stored.id, items.len());
        stored.items = items;
        Ok(stored)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        match order {
            Some(mut order) => {
                order.items = orders::fetch_order_items(order_id, &mut conn).await?;
                Ok(Some(order))
            },
            None => Ok(None),
        }
    }

    async fn orders_for_consumer(&self, consumer_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let mut result = orders::fetch_orders_for_consumer(consumer_id, &mut conn).await?;
        for order in &mut result {
            order.items = orders::fetch_order_items(&order.id, &mut conn).await?;
        }
        Ok(result)
    }

    async fn orders_for_supplier(&self, supplier_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let mut result = orders::fetch_orders_for_supplier(supplier_id, &mut conn).await?;
        for order in &mut result {
            order.items = orders::fetch_order_items(&order.id, &mut conn).await?;
        }
        Ok(result)
    }

    async fn accept_order_transactional(&self, order: &Order) -> Result<Order, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        for item in &order.items {
            let decremented = products::decrement_stock(&item.product_id, item.quantity, &mut tx).await?;
            if !decremented {
                // Dropping the transaction rolls back every decrement already made.
                return Err(OrderGatewayError::InsufficientStock(item.product_id.clone()));
            }
            trace!("🗃️ Stock for product {} reduced by {} for order {}", item.product_id, item.quantity, order.id);
        }
        let updated =
            orders::update_order_status(&order.id, OrderStatusType::Pending, OrderStatusType::Accepted, &mut tx)
                .await?;
        let mut updated = match updated {
            Some(o) => o,
            None => {
                let status = orders::fetch_order_by_id(&order.id, &mut tx)
                    .await?
                    .map(|o| o.status)
                    .ok_or_else(|| OrderGatewayError::OrderNotFound(order.id.clone()))?;
                return Err(OrderGatewayError::InvalidTransition { order_id: order.id.clone(), status });
            },
        };
        tx.commit().await?;
        debug!("🗃️ Order {} accepted. Stock committed for {} line items", updated.id, order.items.len());
        updated.items = order.items.clone();
        Ok(updated)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let updated = orders::update_order_status(order_id, from, to, &mut conn).await?;
        match updated {
            Some(mut order) => {
                order.items = orders::fetch_order_items(order_id, &mut conn).await?;
                debug!("🗃️ Order {} moved from {from} to {to}", order.id);
                Ok(order)
            },
            None => {
                let status = orders::fetch_order_by_id(order_id, &mut conn)
                    .await?
                    .map(|o| o.status)
                    .ok_or_else(|| OrderGatewayError::OrderNotFound(order_id.clone()))?;
                Err(OrderGatewayError::InvalidTransition { order_id: order_id.clone(), status })
            },
        }
    }
}

impl ChatGatewayDatabase for SqliteDatabase {
    async fn get_or_create_conversation(
        &self,
        consumer_id: &str,
        supplier_id: &str,
    ) -> Result<Conversation, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let conv = conversations::idempotent_insert(consumer_id, supplier_id, &mut conn).await?;
        Ok(conv)
    }

    async fn fetch_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let conv = conversations::fetch_conversation_by_id(conversation_id, &mut conn).await?;
        Ok(conv)
    }

    async fn conversations_for_consumer(&self, consumer_id: &str) -> Result<Vec<Conversation>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let convs = conversations::fetch_conversations_for_consumer(consumer_id, &mut conn).await?;
        Ok(convs)
    }

    async fn conversations_for_supplier(&self, supplier_id: &str) -> Result<Vec<Conversation>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let convs = conversations::fetch_conversations_for_supplier(supplier_id, &mut conn).await?;
        Ok(convs)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, ChatGatewayError> {
        let mut tx = self.pool.begin().await?;
        let conv = conversations::fetch_conversation_by_id(&message.conversation_id, &mut tx)
            .await?
            .ok_or_else(|| ChatGatewayError::ConversationNotFound(message.conversation_id.clone()))?;
        let bump_unread = message.sender_role == StoredRole::Consumer;
        let stored = messages::insert_message(message, &mut tx).await?;
        conversations::touch_last_message(&conv.id, bump_unread, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Message {} stored in conversation {}", stored.id, stored.conversation_id);
        Ok(stored)
    }

    async fn messages_for_conversation(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let messages = messages::fetch_messages_for_conversation(conversation_id, limit, offset, &mut conn).await?;
        Ok(messages)
    }

    async fn mark_messages_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
        reader_is_consumer: bool,
    ) -> Result<u64, ChatGatewayError> {
        let mut tx = self.pool.begin().await?;
        let marked = messages::mark_read(conversation_id, reader_id, &mut tx).await?;
        if reader_is_consumer {
            conversations::reset_unread(conversation_id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(marked)
    }

    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let complaint = complaints::insert_complaint(complaint, &mut conn).await?;
        debug!("🗃️ Complaint {} filed against supplier {}", complaint.id, complaint.supplier_id);
        Ok(complaint)
    }

    async fn fetch_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let complaint = complaints::fetch_complaint_by_id(complaint_id, &mut conn).await?;
        Ok(complaint)
    }

    async fn complaints_for_supplier(&self, supplier_id: &str) -> Result<Vec<Complaint>, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let complaints = complaints::fetch_complaints_for_supplier(supplier_id, &mut conn).await?;
        Ok(complaints)
    }

    async fn escalate_complaint(
        &self,
        complaint_id: &str,
        staff_id: &str,
    ) -> Result<(Complaint, Message), ChatGatewayError> {
        let mut tx = self.pool.begin().await?;
        let complaint = complaints::escalate(complaint_id, staff_id, &mut tx)
            .await?
            .ok_or_else(|| ChatGatewayError::ComplaintNotFound(complaint_id.to_string()))?;
        let note = NewMessage {
            conversation_id: complaint.conversation_id.clone(),
            sender_id: staff_id.to_string(),
            sender_role: StoredRole::SalesRep,
            content: ESCALATION_MESSAGE.to_string(),
            attachment_url: None,
        };
        let message = messages::insert_message(note, &mut tx).await?;
        conversations::touch_last_message(&complaint.conversation_id, false, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Complaint {} escalated by {staff_id}", complaint.id);
        Ok((complaint, message))
    }

    async fn resolve_complaint(&self, complaint_id: &str, resolution: &str) -> Result<Complaint, ChatGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let complaint = complaints::resolve(complaint_id, resolution, &mut conn)
            .await?
            .ok_or_else(|| ChatGatewayError::ComplaintNotFound(complaint_id.to_string()))?;
        debug!("🗃️ Complaint {} resolved", complaint.id);
        Ok(complaint)
    }
}
