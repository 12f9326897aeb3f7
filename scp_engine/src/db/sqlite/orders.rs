use log::debug;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType},
    traits::OrderGatewayError,
};

/// Inserts the order header. This is not atomic on its own: embed the call inside a transaction together with
/// [`insert_order_item`] calls and pass `&mut tx` as the connection argument.
pub(crate) async fn insert_order_header(
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderGatewayError> {
    let id = Uuid::new_v4().to_string();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                consumer_id,
                supplier_id,
                status,
                subtotal,
                tax,
                shipping_fee,
                total
            ) VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&order.consumer_id)
    .bind(&order.supplier_id)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.shipping_fee)
    .bind(order.total)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted for consumer {}", order.id, order.consumer_id);
    Ok(order)
}

pub(crate) async fn insert_order_item(
    order_id: &OrderId,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, OrderGatewayError> {
    let id = Uuid::new_v4().to_string();
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(order_id.as_str())
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order_by_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_orders_for_consumer(
    consumer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE consumer_id = $1 ORDER BY created_at DESC")
        .bind(consumer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_orders_for_supplier(
    supplier_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE supplier_id = $1 ORDER BY created_at DESC")
        .bind(supplier_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Flips the order status, conditional on the current status matching `from`. The guard makes racing transition
/// requests safe: exactly one of two concurrent flips can see the expected status, the other gets `None`.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to)
    .bind(order_id.as_str())
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
