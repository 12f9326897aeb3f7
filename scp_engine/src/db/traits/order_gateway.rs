use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType, Product, ProductPatch};

/// This trait defines the persistence behaviour for products and the order lifecycle.
///
/// This behaviour includes:
/// * Reading products for pricing and validation.
/// * Creating orders atomically (header plus all line items, or nothing).
/// * The guarded lifecycle transitions: status flips are conditional on the expected current status so that two racing
///   transition requests can never both succeed, and stock is only ever mutated through a conditional decrement so
///   that concurrent acceptances can never oversell a product.
#[allow(async_fn_in_trait)]
pub trait OrderGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the product with the given id, or `None` if it does not exist.
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderGatewayError>;

    /// Applies the populated fields of `patch` to the product. Returns the updated product, or `None` if the product
    /// does not exist. An empty patch is an error rather than a silent no-op.
    async fn update_product(&self, product_id: &str, patch: ProductPatch)
        -> Result<Option<Product>, OrderGatewayError>;

    /// Takes a priced order and, in a single atomic transaction, stores the order header and every line item.
    /// Either the complete order becomes visible to readers, or none of it does.
    ///
    /// Returns the fully populated order, including its items.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderGatewayError>;

    /// Fetches the order with the given id, with its line items loaded. `None` if it does not exist.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError>;

    /// All orders placed by the given consumer, newest first. Items are loaded for each order.
    async fn orders_for_consumer(&self, consumer_id: &str) -> Result<Vec<Order>, OrderGatewayError>;

    /// All orders addressed to the given supplier, newest first. Items are loaded for each order.
    async fn orders_for_supplier(&self, supplier_id: &str) -> Result<Vec<Order>, OrderGatewayError>;

    /// Accepts a pending order. In ONE transaction:
    /// * every line item's quantity is subtracted from its product's stock, conditional on sufficient stock remaining
    ///   (`InsufficientStock` aborts and rolls back every decrement already made), and
    /// * the order status flips from `pending` to `accepted`, conditional on the status still being `pending`
    ///   (`InvalidTransition` if a concurrent transition won the race).
    ///
    /// Returns the updated order.
    async fn accept_order_transactional(&self, order: &Order) -> Result<Order, OrderGatewayError>;

    /// Flips the order status from `from` to `to`, conditional on the current status equalling `from`.
    /// Fails with `InvalidTransition` if the order's status has moved on in the meantime, and with `OrderNotFound` if
    /// the order does not exist at all.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, OrderGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(String),
    #[error("Product {product_id} does not belong to supplier {supplier_id}")]
    ProductSupplierMismatch { product_id: String, supplier_id: String },
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(String),
    #[error("Quantity must be at least {minimum} for product {product_id}")]
    BelowMinimumOrderQuantity { product_id: String, minimum: i64 },
    #[error("Order total must be greater than 0")]
    EmptyOrderTotal,
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Order {order_id} cannot change status from {status}")]
    InvalidTransition { order_id: OrderId, status: OrderStatusType },
    #[error("The requested product change would result in a no-op.")]
    ProductModificationNoOp,
}

impl OrderGatewayError {
    /// True for the input-constraint failures a caller can correct and retry.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            OrderGatewayError::ProductSupplierMismatch { .. } |
                OrderGatewayError::BelowMinimumOrderQuantity { .. } |
                OrderGatewayError::EmptyOrderTotal
        )
    }
}

impl From<sqlx::Error> for OrderGatewayError {
    fn from(e: sqlx::Error) -> Self {
        OrderGatewayError::DatabaseError(e.to_string())
    }
}
