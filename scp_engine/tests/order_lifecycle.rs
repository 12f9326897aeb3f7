use std::time::Duration;

use log::*;
use scp_common::Money;
use scp_engine::{
    db_types::{NewProduct, OrderStatusType, Product, ProductPatch},
    order_objects::{CreateOrderRequest, OrderItemRequest},
    sqlite::products,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{OrderGatewayDatabase, OrderGatewayError},
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn seed_product(db: &SqliteDatabase, supplier_id: &str, price: Money, discount: Option<f64>, stock: i64, moq: i64) -> Product {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let product = NewProduct {
        supplier_id: supplier_id.to_string(),
        name: "Bulk Arabica Beans".to_string(),
        price,
        discount,
        stock_level: stock,
        min_order_quantity: moq,
    };
    products::insert_product(product, &mut conn).await.expect("Error seeding product")
}

fn one_line_order(supplier_id: &str, product_id: &str, quantity: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        supplier_id: supplier_id.to_string(),
        items: vec![OrderItemRequest { product_id: product_id.to_string(), quantity }],
    }
}

#[tokio::test]
async fn create_order_prices_discounts_and_tax() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(100), Some(10.0), 20, 1).await;
    let api = OrderFlowApi::new(db, Default::default());

    let order = api
        .create_order("consumer-1", one_line_order("supplier-1", &product.id, 5))
        .await
        .expect("Order creation failed");

    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.subtotal, Money::from_major(450));
    assert_eq!(order.tax, Money::from_major(45));
    assert_eq!(order.shipping_fee, Money::default());
    assert_eq!(order.total, Money::from_major(495));
    assert_eq!(order.total, order.subtotal + order.tax + order.shipping_fee);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 5);
    assert_eq!(order.items[0].unit_price, Money::from_major(90));
    assert_eq!(order.items[0].subtotal, Money::from_major(450));
}

#[tokio::test]
async fn accept_commits_stock_and_is_not_repeatable() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(100), Some(10.0), 20, 1).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());
    let order = api.create_order("consumer-1", one_line_order("supplier-1", &product.id, 5)).await.unwrap();

    // Creation is only an advisory stock check; nothing is reserved yet.
    let live = db.fetch_product(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock_level, 20);

    let accepted = api.accept_order(&order.id, "supplier-1").await.expect("Accept failed");
    assert_eq!(accepted.status, OrderStatusType::Accepted);
    let live = db.fetch_product(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock_level, 15);

    // A second accept must fail without touching stock again.
    let err = api.accept_order(&order.id, "supplier-1").await.expect_err("Second accept should fail");
    assert!(matches!(err, OrderGatewayError::InvalidTransition { .. }), "got {err}");
    let live = db.fetch_product(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock_level, 15);
}

#[tokio::test]
async fn accept_rolls_back_every_decrement_when_one_item_runs_dry() {
    let db = new_test_db().await;
    let plenty = seed_product(&db, "supplier-1", Money::from_major(10), None, 100, 1).await;
    let scarce = seed_product(&db, "supplier-1", Money::from_major(20), None, 10, 1).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());
    let req = CreateOrderRequest {
        supplier_id: "supplier-1".to_string(),
        items: vec![
            OrderItemRequest { product_id: plenty.id.clone(), quantity: 4 },
            OrderItemRequest { product_id: scarce.id.clone(), quantity: 8 },
        ],
    };
    let order = api.create_order("consumer-1", req).await.unwrap();

    // Drain the scarce product behind the order's back.
    db.update_product(&scarce.id, ProductPatch { stock_level: Some(3), ..Default::default() })
        .await
        .unwrap()
        .unwrap();

    let err = api.accept_order(&order.id, "supplier-1").await.expect_err("Accept should fail on the scarce item");
    assert!(matches!(err, OrderGatewayError::InsufficientStock(ref id) if *id == scarce.id), "got {err}");

    // The first item's decrement must have rolled back, and the order must still be pending.
    assert_eq!(db.fetch_product(&plenty.id).await.unwrap().unwrap().stock_level, 100);
    assert_eq!(db.fetch_product(&scarce.id).await.unwrap().unwrap().stock_level, 3);
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatusType::Pending);
}

#[tokio::test]
async fn reject_and_cancel_leave_stock_alone() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(50), None, 30, 1).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());

    let rejected = api.create_order("consumer-1", one_line_order("supplier-1", &product.id, 3)).await.unwrap();
    let rejected = api.reject_order(&rejected.id, "supplier-1").await.expect("Reject failed");
    assert_eq!(rejected.status, OrderStatusType::Rejected);

    let cancelled = api.create_order("consumer-1", one_line_order("supplier-1", &product.id, 3)).await.unwrap();
    let cancelled = api.cancel_order(&cancelled.id, "consumer-1").await.expect("Cancel failed");
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);

    assert_eq!(db.fetch_product(&product.id).await.unwrap().unwrap().stock_level, 30);
}

#[tokio::test]
async fn terminal_orders_admit_no_further_transitions() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(50), None, 30, 1).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());
    let order = api.create_order("consumer-1", one_line_order("supplier-1", &product.id, 2)).await.unwrap();
    api.cancel_order(&order.id, "consumer-1").await.unwrap();

    for result in [
        api.accept_order(&order.id, "supplier-1").await,
        api.reject_order(&order.id, "supplier-1").await,
        api.cancel_order(&order.id, "consumer-1").await,
    ] {
        let err = result.expect_err("Transition out of a terminal state should fail");
        assert!(matches!(err, OrderGatewayError::InvalidTransition { .. }), "got {err}");
    }
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatusType::Cancelled);
}

#[tokio::test]
async fn only_the_owning_parties_may_transition() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(50), None, 30, 1).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());
    let order = api.create_order("consumer-1", one_line_order("supplier-1", &product.id, 2)).await.unwrap();

    let err = api.accept_order(&order.id, "supplier-2").await.expect_err("Foreign supplier accepted an order");
    assert!(matches!(err, OrderGatewayError::Unauthorized(_)), "got {err}");
    let err = api.cancel_order(&order.id, "consumer-2").await.expect_err("Foreign consumer cancelled an order");
    assert!(matches!(err, OrderGatewayError::Unauthorized(_)), "got {err}");
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatusType::Pending);
}

#[tokio::test]
async fn creation_validations_fire_in_order() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(25), None, 10, 5).await;
    let api = OrderFlowApi::new(db.clone(), Default::default());

    let err = api
        .create_order("consumer-1", one_line_order("supplier-1", "no-such-product", 5))
        .await
        .expect_err("Unknown product accepted");
    assert!(matches!(err, OrderGatewayError::ProductNotFound(_)), "got {err}");

    let err = api
        .create_order("consumer-1", one_line_order("supplier-2", &product.id, 5))
        .await
        .expect_err("Cross-supplier cart accepted");
    assert!(matches!(err, OrderGatewayError::ProductSupplierMismatch { .. }), "got {err}");

    let err = api
        .create_order("consumer-1", one_line_order("supplier-1", &product.id, 11))
        .await
        .expect_err("Oversized order accepted");
    assert!(matches!(err, OrderGatewayError::InsufficientStock(_)), "got {err}");

    // Below the product minimum fails regardless of available stock.
    let err = api
        .create_order("consumer-1", one_line_order("supplier-1", &product.id, 4))
        .await
        .expect_err("Sub-minimum order accepted");
    assert!(matches!(err, OrderGatewayError::BelowMinimumOrderQuantity { minimum: 5, .. }), "got {err}");
    assert!(err.is_validation_failure());
}

#[tokio::test]
async fn fully_discounted_orders_are_refused() {
    let db = new_test_db().await;
    let product = seed_product(&db, "supplier-1", Money::from_major(40), Some(100.0), 10, 1).await;
    let api = OrderFlowApi::new(db, Default::default());
    let err = api
        .create_order("consumer-1", one_line_order("supplier-1", &product.id, 2))
        .await
        .expect_err("Zero-total order accepted");
    assert!(matches!(err, OrderGatewayError::EmptyOrderTotal), "got {err}");
}

const NUM_ORDERS: u64 = 20;
const RATE: u64 = 100; // orders per second

#[test]
fn burst_orders() {
    info!("🚀️ Starting order injection test");

    let sys = Runtime::new().unwrap();
    let delay = Duration::from_millis(1000 / RATE);

    sys.block_on(async move {
        let db = new_test_db().await;
        let product = seed_product(&db, "supplier-1", Money::from_major(12), None, 10_000, 1).await;
        let api = OrderFlowApi::new(db.clone(), Default::default());

        let mut timer = tokio::time::interval(delay);
        info!("🚀️ Injecting {NUM_ORDERS} orders");
        for i in 0..NUM_ORDERS {
            timer.tick().await;
            let consumer = format!("consumer-{}", (i + 1) % 5);
            #[allow(clippy::cast_possible_wrap)]
            let quantity = (i + 1) as i64;
            if let Err(e) = api.create_order(&consumer, one_line_order("supplier-1", &product.id, quantity)).await {
                panic!("Error processing order {i}: {e}");
            }
        }
        let orders = db.orders_for_supplier("supplier-1").await.expect("Error listing orders");
        assert_eq!(orders.len() as u64, NUM_ORDERS);
    });
    info!("🚀️ test complete");
}
