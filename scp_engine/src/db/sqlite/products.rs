use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use uuid::Uuid;

use crate::{
    db_types::{NewProduct, Product, ProductPatch},
    traits::OrderGatewayError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, supplier_id, name, price, discount, stock_level, min_order_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&product.supplier_id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.discount)
    .bind(product.stock_level)
    .bind(product.min_order_quantity)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product_by_id(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Applies the populated fields of the patch. Returns `None` if the product does not exist.
pub(crate) async fn update_product(
    product_id: &str,
    patch: ProductPatch,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, OrderGatewayError> {
    if patch.is_empty() {
        debug!("🛒️ No fields to update for product {product_id}. Update request skipped.");
        return Err(OrderGatewayError::ProductModificationNoOp);
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = patch.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(price) = patch.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(discount) = patch.discount {
        set_clause.push("discount = ");
        set_clause.push_bind_unseparated(discount);
    }
    if let Some(stock_level) = patch.stock_level {
        set_clause.push("stock_level = ");
        set_clause.push_bind_unseparated(stock_level);
    }
    if let Some(moq) = patch.min_order_quantity {
        set_clause.push("min_order_quantity = ");
        set_clause.push_bind_unseparated(moq);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder.push(" RETURNING *");
    trace!("🛒️ Executing query: {}", builder.sql());
    let res = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Product::from_row(&row)).transpose()?;
    Ok(res)
}

/// Subtracts `quantity` from the product's stock level, conditional on enough stock remaining. The check and the
/// decrement happen in a single statement so concurrent callers can never drive the stock negative.
///
/// Returns `true` if the decrement was applied, `false` if the precondition failed (or the product does not exist).
pub(crate) async fn decrement_stock(
    product_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_level = stock_level - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND stock_level >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
