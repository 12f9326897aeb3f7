use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use scp_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed by a consumer and awaits a supplier decision.
    Pending,
    /// The owning supplier has accepted the order and stock has been committed.
    Accepted,
    /// The owning supplier has rejected the order.
    Rejected,
    /// The owning consumer has withdrawn the order before a supplier decision.
    Cancelled,
}

impl OrderStatusType {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Accepted => write!(f, "accepted"),
            OrderStatusType::Rejected => write!(f, "rejected"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub consumer_id: String,
    pub supplier_id: String,
    pub status: OrderStatusType,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub total: Money,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: OrderId,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at the time the order was placed, after any product discount. Decoupled from the live product
    /// price.
    pub unit_price: Money,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
}

/// A priced order ready for insertion. Pricing is computed by the order flow API; the database stores the header and
/// all line items in a single transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub consumer_id: String,
    pub supplier_id: String,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

//--------------------------------------       Product         -------------------------------------------------------
/// A supplier catalog entry. The engine reads products for pricing and validation and mutates stock only through the
/// conditional decrement; all other product maintenance goes through [`ProductPatch`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub supplier_id: String,
    pub name: String,
    pub price: Money,
    /// Discount percentage in the range 0–100, if any.
    pub discount: Option<f64>,
    pub stock_level: i64,
    pub min_order_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The price a buyer pays per unit right now, with any discount applied.
    pub fn effective_price(&self) -> Money {
        match self.discount {
            Some(d) => self.price.discounted(d),
            None => self.price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub supplier_id: String,
    pub name: String,
    pub price: Money,
    pub discount: Option<f64>,
    pub stock_level: i64,
    pub min_order_quantity: i64,
}

/// Field-by-field product update. Only populated slots are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub discount: Option<f64>,
    pub stock_level: Option<i64>,
    pub min_order_quantity: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.price.is_none() &&
            self.discount.is_none() &&
            self.stock_level.is_none() &&
            self.min_order_quantity.is_none()
    }
}

//--------------------------------------         Role          -------------------------------------------------------
/// Organisational role of an authenticated actor. Everything except `Consumer` is supplier staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Consumer,
    Owner,
    Manager,
    SalesRep,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Consumer)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Consumer => write!(f, "consumer"),
            Role::Owner => write!(f, "owner"),
            Role::Manager => write!(f, "manager"),
            Role::SalesRep => write!(f, "sales_rep"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" => Ok(Self::Consumer),
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "sales_rep" => Ok(Self::SalesRep),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------      StoredRole       -------------------------------------------------------
/// The persisted sender-role vocabulary. Message storage only ever distinguishes the two sides of a conversation, so
/// every staff role collapses to `sales_rep` on the way in. The actor's organisational [`Role`] survives only in
/// transient responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StoredRole {
    Consumer,
    SalesRep,
}

impl From<Role> for StoredRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Consumer => StoredRole::Consumer,
            Role::Owner | Role::Manager | Role::SalesRep => StoredRole::SalesRep,
        }
    }
}

impl Display for StoredRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredRole::Consumer => write!(f, "consumer"),
            StoredRole::SalesRep => write!(f, "sales_rep"),
        }
    }
}

impl FromStr for StoredRole {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" => Ok(Self::Consumer),
            "sales_rep" => Ok(Self::SalesRep),
            s => Err(ConversionError(format!("Invalid stored role: {s}"))),
        }
    }
}

//--------------------------------------     Conversation      -------------------------------------------------------
/// Exactly one conversation exists per (consumer, supplier) pair, enforced by a uniqueness constraint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub consumer_id: String,
    pub supplier_id: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Message        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_role: StoredRole,
    pub content: String,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_role: StoredRole,
    pub content: String,
    pub attachment_url: Option<String>,
}

//--------------------------------------  ComplaintPriority    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Display for ComplaintPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintPriority::Low => write!(f, "low"),
            ComplaintPriority::Medium => write!(f, "medium"),
            ComplaintPriority::High => write!(f, "high"),
            ComplaintPriority::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for ComplaintPriority {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            s => Err(ConversionError(format!("Invalid complaint priority: {s}"))),
        }
    }
}

//--------------------------------------   ComplaintStatus     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Open,
    Escalated,
    Resolved,
}

impl Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintStatus::Open => write!(f, "open"),
            ComplaintStatus::Escalated => write!(f, "escalated"),
            ComplaintStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "escalated" => Ok(Self::Escalated),
            "resolved" => Ok(Self::Resolved),
            s => Err(ConversionError(format!("Invalid complaint status: {s}"))),
        }
    }
}

//--------------------------------------       Complaint       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub conversation_id: String,
    pub consumer_id: String,
    pub supplier_id: String,
    pub order_id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub escalated_by: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub conversation_id: String,
    pub consumer_id: String,
    pub supplier_id: String,
    pub order_id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: ComplaintPriority,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn staff_roles_collapse_to_sales_rep() {
        assert_eq!(StoredRole::from(Role::Owner), StoredRole::SalesRep);
        assert_eq!(StoredRole::from(Role::Manager), StoredRole::SalesRep);
        assert_eq!(StoredRole::from(Role::SalesRep), StoredRole::SalesRep);
        assert_eq!(StoredRole::from(Role::Consumer), StoredRole::Consumer);
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Accepted,
            OrderStatusType::Rejected,
            OrderStatusType::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn effective_price_applies_discount() {
        let mut product = Product {
            id: "p1".to_string(),
            supplier_id: "s1".to_string(),
            name: "Widget".to_string(),
            price: Money::from_major(100),
            discount: Some(10.0),
            stock_level: 20,
            min_order_quantity: 1,
            created_at: Utc::now(),
            updated_at: None,
        };
        assert_eq!(product.effective_price(), Money::from_major(90));
        product.discount = None;
        assert_eq!(product.effective_price(), Money::from_major(100));
    }
}
