use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;

use crate::auth::{ROLE_HEADER, SUPPLIER_ID_HEADER, USER_ID_HEADER};

/// An upstream-authenticated actor, as the gateway would present it.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub role: String,
    pub supplier_id: Option<String>,
}

impl TestUser {
    pub fn consumer(user_id: &str) -> Self {
        Self { user_id: user_id.to_string(), role: "consumer".to_string(), supplier_id: None }
    }

    pub fn staff(user_id: &str, role: &str, supplier_id: &str) -> Self {
        Self { user_id: user_id.to_string(), role: role.to_string(), supplier_id: Some(supplier_id.to_string()) }
    }
}

pub async fn get_request(
    user: Option<&TestUser>,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::get().uri(path);
    send(with_claims(req, user), configure).await
}

pub async fn post_request(
    user: Option<&TestUser>,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::post().uri(path).set_json(body);
    send(with_claims(req, user), configure).await
}

pub async fn patch_request(
    user: Option<&TestUser>,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::patch().uri(path).set_json(body);
    send(with_claims(req, user), configure).await
}

fn with_claims(mut req: TestRequest, user: Option<&TestUser>) -> TestRequest {
    if let Some(user) = user {
        req = req.insert_header((USER_ID_HEADER, user.user_id.as_str()));
        req = req.insert_header((ROLE_HEADER, user.role.as_str()));
        if let Some(supplier_id) = &user.supplier_id {
            req = req.insert_header((SUPPLIER_ID_HEADER, supplier_id.as_str()));
        }
    }
    req
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}
