use chrono::Utc;
use mockall::mock;
use scp_common::Money;
use scp_engine::{
    db_types::{
        Complaint,
        ComplaintPriority,
        ComplaintStatus,
        Conversation,
        Message,
        NewComplaint,
        NewMessage,
        NewOrder,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Product,
        ProductPatch,
        StoredRole,
    },
    traits::{ChatGatewayDatabase, ChatGatewayError, OrderGatewayDatabase, OrderGatewayError},
};

mock! {
    pub OrderDb {}

    impl Clone for OrderDb {
        fn clone(&self) -> Self;
    }

    impl OrderGatewayDatabase for OrderDb {
        fn url(&self) -> &str;
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderGatewayError>;
        async fn update_product(&self, product_id: &str, patch: ProductPatch) -> Result<Option<Product>, OrderGatewayError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderGatewayError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError>;
        async fn orders_for_consumer(&self, consumer_id: &str) -> Result<Vec<Order>, OrderGatewayError>;
        async fn orders_for_supplier(&self, supplier_id: &str) -> Result<Vec<Order>, OrderGatewayError>;
        async fn accept_order_transactional(&self, order: &Order) -> Result<Order, OrderGatewayError>;
        async fn update_order_status(&self, order_id: &OrderId, from: OrderStatusType, to: OrderStatusType) -> Result<Order, OrderGatewayError>;
    }
}

mock! {
    pub ChatDb {}

    impl Clone for ChatDb {
        fn clone(&self) -> Self;
    }

    impl ChatGatewayDatabase for ChatDb {
        async fn get_or_create_conversation(&self, consumer_id: &str, supplier_id: &str) -> Result<Conversation, ChatGatewayError>;
        async fn fetch_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>, ChatGatewayError>;
        async fn conversations_for_consumer(&self, consumer_id: &str) -> Result<Vec<Conversation>, ChatGatewayError>;
        async fn conversations_for_supplier(&self, supplier_id: &str) -> Result<Vec<Conversation>, ChatGatewayError>;
        async fn create_message(&self, message: NewMessage) -> Result<Message, ChatGatewayError>;
        async fn messages_for_conversation(&self, conversation_id: &str, limit: i64, offset: i64) -> Result<Vec<Message>, ChatGatewayError>;
        async fn mark_messages_read(&self, conversation_id: &str, reader_id: &str, reader_is_consumer: bool) -> Result<u64, ChatGatewayError>;
        async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, ChatGatewayError>;
        async fn fetch_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>, ChatGatewayError>;
        async fn complaints_for_supplier(&self, supplier_id: &str) -> Result<Vec<Complaint>, ChatGatewayError>;
        async fn escalate_complaint(&self, complaint_id: &str, staff_id: &str) -> Result<(Complaint, Message), ChatGatewayError>;
        async fn resolve_complaint(&self, complaint_id: &str, resolution: &str) -> Result<Complaint, ChatGatewayError>;
    }
}

pub fn sample_product(id: &str, supplier_id: &str) -> Product {
    Product {
        id: id.to_string(),
        supplier_id: supplier_id.to_string(),
        name: "Catering rice 25kg".to_string(),
        price: Money::from_major(100),
        discount: Some(10.0),
        stock_level: 20,
        min_order_quantity: 1,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Turns a priced [`NewOrder`] into the order the database would hand back.
pub fn stored_order(order: NewOrder) -> Order {
    let order_id = OrderId::from("order-1".to_string());
    let items = order
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| OrderItem {
            id: format!("item-{i}"),
            order_id: order_id.clone(),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
            created_at: Utc::now(),
        })
        .collect();
    Order {
        id: order_id,
        consumer_id: order.consumer_id,
        supplier_id: order.supplier_id,
        status: OrderStatusType::Pending,
        subtotal: order.subtotal,
        tax: order.tax,
        shipping_fee: order.shipping_fee,
        total: order.total,
        items,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn sample_order(id: &str, consumer_id: &str, supplier_id: &str, status: OrderStatusType) -> Order {
    Order {
        id: OrderId::from(id.to_string()),
        consumer_id: consumer_id.to_string(),
        supplier_id: supplier_id.to_string(),
        status,
        subtotal: Money::from_major(450),
        tax: Money::from_major(45),
        shipping_fee: Money::default(),
        total: Money::from_major(495),
        items: Vec::new(),
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn sample_conversation(id: &str, consumer_id: &str, supplier_id: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        consumer_id: consumer_id.to_string(),
        supplier_id: supplier_id.to_string(),
        last_message_at: None,
        unread_count: 0,
        created_at: Utc::now(),
    }
}

pub fn stored_message(message: NewMessage) -> Message {
    Message {
        id: "message-1".to_string(),
        conversation_id: message.conversation_id,
        sender_id: message.sender_id,
        sender_role: message.sender_role,
        content: message.content,
        attachment_url: message.attachment_url,
        is_read: false,
        created_at: Utc::now(),
    }
}

pub fn sample_complaint(id: &str, supplier_id: &str, status: ComplaintStatus) -> Complaint {
    Complaint {
        id: id.to_string(),
        conversation_id: "conversation-1".to_string(),
        consumer_id: "consumer-1".to_string(),
        supplier_id: supplier_id.to_string(),
        order_id: None,
        title: "Late delivery".to_string(),
        description: "The last three deliveries arrived a day late.".to_string(),
        priority: ComplaintPriority::High,
        status,
        escalated_by: None,
        escalated_at: None,
        resolution: None,
        resolved_at: None,
        created_at: Utc::now(),
    }
}

pub fn escalation_note(complaint: &Complaint, staff_id: &str) -> Message {
    Message {
        id: "message-2".to_string(),
        conversation_id: complaint.conversation_id.clone(),
        sender_id: staff_id.to_string(),
        sender_role: StoredRole::SalesRep,
        content: scp_engine::traits::ESCALATION_MESSAGE.to_string(),
        attachment_url: None,
        is_read: false,
        created_at: Utc::now(),
    }
}
