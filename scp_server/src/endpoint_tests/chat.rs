use actix_web::{http::StatusCode, web, web::ServiceConfig};
use scp_engine::{db_types::ComplaintStatus, events::EventProducers, ChatApi, ComplaintApi};
use serde_json::json;

use super::{
    helpers::{post_request, TestUser},
    mocks::{escalation_note, sample_complaint, sample_conversation, stored_message, MockChatDb},
};
use crate::routes::{EscalateComplaintRoute, MarkReadRoute, ResolveComplaintRoute, SendMessageRoute};

fn configure_send_message(cfg: &mut ServiceConfig) {
    let mut db = MockChatDb::new();
    db.expect_fetch_conversation()
        .returning(|id| Ok(Some(sample_conversation(id, "consumer-1", "supplier-1"))));
    db.expect_create_message().returning(|message| Ok(stored_message(message)));
    let api = ChatApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(SendMessageRoute::<MockChatDb>::new());
}

#[actix_web::test]
async fn manager_messages_collapse_in_storage_but_not_in_the_response() {
    let _ = env_logger::try_init().ok();
    let manager = TestUser::staff("manager-1", "manager", "supplier-1");
    let body = json!({ "content": "We will look into it" });
    let (status, body) =
        post_request(Some(&manager), "/conversations/conversation-1/messages", body, configure_send_message).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    let message: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(message["sender_role"], "sales_rep");
    assert_eq!(message["display_role"], "manager");
    assert_eq!(message["type"], "text");
}

#[actix_web::test]
async fn attachments_are_classified_by_extension() {
    let _ = env_logger::try_init().ok();
    let consumer = TestUser::consumer("consumer-1");
    let body = json!({ "content": "site photo", "attachment_url": "/uploads/site.jpeg" });
    let (status, body) =
        post_request(Some(&consumer), "/conversations/conversation-1/messages", body, configure_send_message).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    let message: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(message["type"], "image");
    assert_eq!(message["sender_role"], "consumer");
}

#[actix_web::test]
async fn outsiders_cannot_post_into_a_conversation() {
    let _ = env_logger::try_init().ok();
    let outsider = TestUser::consumer("consumer-2");
    let body = json!({ "content": "let me in" });
    let (status, _) =
        post_request(Some(&outsider), "/conversations/conversation-1/messages", body, configure_send_message).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure_mark_read(cfg: &mut ServiceConfig) {
    let mut db = MockChatDb::new();
    db.expect_fetch_conversation()
        .returning(|id| Ok(Some(sample_conversation(id, "consumer-1", "supplier-1"))));
    db.expect_mark_messages_read()
        .withf(|_, reader_id, reader_is_consumer| reader_id == "consumer-1" && *reader_is_consumer)
        .returning(|_, _, _| Ok(2));
    let api = ChatApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(MarkReadRoute::<MockChatDb>::new());
}

#[actix_web::test]
async fn marking_read_reports_the_count() {
    let _ = env_logger::try_init().ok();
    let consumer = TestUser::consumer("consumer-1");
    let (status, body) =
        post_request(Some(&consumer), "/conversations/conversation-1/read", json!({}), configure_mark_read).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert!(body.contains("2 messages marked as read"), "body: {body}");
}

fn configure_escalate(cfg: &mut ServiceConfig) {
    let mut db = MockChatDb::new();
    db.expect_escalate_complaint().returning(|id, staff_id| {
        let mut complaint = sample_complaint(id, "supplier-1", ComplaintStatus::Escalated);
        complaint.escalated_by = Some(staff_id.to_string());
        let note = escalation_note(&complaint, staff_id);
        Ok((complaint, note))
    });
    let api = ComplaintApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(EscalateComplaintRoute::<MockChatDb>::new());
}

#[actix_web::test]
async fn escalation_is_reserved_for_staff() {
    let _ = env_logger::try_init().ok();
    let consumer = TestUser::consumer("consumer-1");
    let (status, _) =
        post_request(Some(&consumer), "/complaints/complaint-1/escalate", json!({}), configure_escalate).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn escalation_returns_the_escalated_complaint() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-9", "sales_rep", "supplier-1");
    let (status, body) =
        post_request(Some(&staff), "/complaints/complaint-1/escalate", json!({}), configure_escalate).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let complaint: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(complaint["status"], "escalated");
    assert_eq!(complaint["escalated_by"], "rep-9");
}

fn configure_resolve(cfg: &mut ServiceConfig) {
    let mut db = MockChatDb::new();
    db.expect_fetch_complaint()
        .returning(|id| Ok(Some(sample_complaint(id, "supplier-1", ComplaintStatus::Open))));
    db.expect_resolve_complaint().returning(|id, resolution| {
        let mut complaint = sample_complaint(id, "supplier-1", ComplaintStatus::Resolved);
        complaint.resolution = Some(resolution.to_string());
        Ok(complaint)
    });
    let api = ComplaintApi::new(db, EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(ResolveComplaintRoute::<MockChatDb>::new());
}

#[actix_web::test]
async fn short_resolutions_are_rejected_before_touching_the_database() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "owner", "supplier-1");
    let body = json!({ "resolution": "123456789" });
    let (status, body) =
        post_request(Some(&staff), "/complaints/complaint-1/resolve", body, configure_resolve).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert!(body.contains("at least 10"), "body: {body}");
}

#[actix_web::test]
async fn ten_character_resolutions_pass_the_boundary() {
    let _ = env_logger::try_init().ok();
    let staff = TestUser::staff("rep-1", "owner", "supplier-1");
    let body = json!({ "resolution": "1234567890" });
    let (status, body) =
        post_request(Some(&staff), "/complaints/complaint-1/resolve", body, configure_resolve).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let complaint: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(complaint["status"], "resolved");
    assert_eq!(complaint["resolution"], "1234567890");
}
