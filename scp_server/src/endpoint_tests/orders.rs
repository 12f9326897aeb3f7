use actix_web::{http::StatusCode, web, web::ServiceConfig};
use scp_engine::{db_types::OrderStatusType, events::EventProducers, OrderFlowApi};
use serde_json::json;

use super::{
    helpers::{get_request, patch_request, post_request, TestUser},
    mocks::{sample_order, sample_product, stored_order, MockOrderDb},
};
use crate::routes::{AcceptOrderRoute, CreateOrderRoute, OrderByIdRoute, UpdateProductRoute};

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, "supplier-1"))));
    db.expect_insert_order().returning(|order| Ok(stored_order(order)));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(CreateOrderRoute::<MockOrderDb>::new());
}

#[actix_web::test]
async fn create_order_prices_the_cart_and_returns_created() {
    let _ = env_logger::try_init().ok();
    let consumer = TestUser::consumer("consumer-1");
    let body = json!({ "supplier_id": "supplier-1", "items": [{ "product_id": "p-1", "quantity": 5 }] });
    let (status, body) = post_request(Some(&consumer), "/orders", body, configure_create).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotal"], 45_000);
    assert_eq!(order["tax"], 4_500);
    assert_eq!(order["total"], 49_500);
    assert_eq!(order["items"][0]["unit_price"], 9_000);
}

#[actix_web::test]
async fn create_order_requires_the_consumer_role() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "sales_rep", "supplier-1");
    let body = json!({ "supplier_id": "supplier-1", "items": [{ "product_id": "p-1", "quantity": 5 }] });
    let (status, _) = post_request(Some(&staff), "/orders", body, configure_create).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_order_requires_an_authenticated_identity() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "supplier_id": "supplier-1", "items": [] });
    let (status, _) = post_request(None, "/orders", body, configure_create).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure_accept_decided(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(sample_order(id.as_str(), "consumer-1", "supplier-1", OrderStatusType::Accepted))));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(AcceptOrderRoute::<MockOrderDb>::new());
}

#[actix_web::test]
async fn accepting_a_decided_order_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "manager", "supplier-1");
    let (status, body) = post_request(Some(&staff), "/orders/order-1/accept", json!({}), configure_accept_decided).await;
    assert_eq!(status, StatusCode::CONFLICT, "body: {body}");
    assert!(body.contains("cannot change status"), "body: {body}");
}

fn configure_accept_foreign(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_order()
        .returning(|id| Ok(Some(sample_order(id.as_str(), "consumer-1", "supplier-2", OrderStatusType::Pending))));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(AcceptOrderRoute::<MockOrderDb>::new());
}

#[actix_web::test]
async fn accepting_another_suppliers_order_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "manager", "supplier-1");
    let (status, _) = post_request(Some(&staff), "/orders/order-1/accept", json!({}), configure_accept_foreign).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure_patch_product(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, "supplier-1"))));
    db.expect_update_product()
        .withf(|_, patch| patch.stock_level == Some(50) && patch.price.is_none())
        .returning(|id, patch| {
            let mut product = sample_product(id, "supplier-1");
            product.stock_level = patch.stock_level.unwrap();
            Ok(Some(product))
        });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(UpdateProductRoute::<MockOrderDb>::new());
}

#[actix_web::test]
async fn product_patches_apply_only_the_populated_fields() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "owner", "supplier-1");
    let (status, body) =
        patch_request(Some(&staff), "/products/p-1", json!({ "stock_level": 50 }), configure_patch_product).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let product: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["stock_level"], 50);
}

#[actix_web::test]
async fn patching_another_suppliers_product_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "owner", "supplier-2");
    let (status, _) =
        patch_request(Some(&staff), "/products/p-1", json!({ "stock_level": 50 }), configure_patch_product).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure_missing_order(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(OrderByIdRoute::<MockOrderDb>::new());
}

#[actix_web::test]
async fn fetching_a_missing_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let consumer = TestUser::consumer("consumer-1");
    let (status, _) = get_request(Some(&consumer), "/orders/nope", configure_missing_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
