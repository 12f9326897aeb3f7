use scp_engine::{
    chat_objects::MessageDestination,
    db_types::{ComplaintPriority, ComplaintStatus, NewComplaint, Role, StoredRole},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{ChatGatewayDatabase, ChatGatewayError, ESCALATION_MESSAGE},
    ChatApi,
    ComplaintApi,
    SqliteDatabase,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn complaint_for(conversation_id: &str) -> NewComplaint {
    NewComplaint {
        conversation_id: conversation_id.to_string(),
        consumer_id: "consumer-1".to_string(),
        supplier_id: "supplier-1".to_string(),
        order_id: None,
        title: "Late delivery".to_string(),
        description: "The last three deliveries arrived a day late.".to_string(),
        priority: ComplaintPriority::High,
    }
}

#[tokio::test]
async fn get_or_create_returns_the_same_conversation_every_time() {
    let db = new_test_db().await;
    let api = ChatApi::new(db, Default::default());
    let first = api.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();
    let second = api.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();
    assert_eq!(first.id, second.id);
    let other_pair = api.get_or_create_conversation("consumer-1", "supplier-2").await.unwrap();
    assert_ne!(first.id, other_pair.id);
}

#[tokio::test]
async fn concurrent_first_contacts_yield_exactly_one_conversation() {
    let db = new_test_db().await;
    let mut tasks = Vec::new();
    for _ in 0..10 {
        let db = db.clone();
        tasks.push(tokio::spawn(async move {
            db.get_or_create_conversation("consumer-1", "supplier-1").await.map(|c| c.id)
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().expect("get_or_create failed under concurrency"));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1, "every concurrent caller must see the same conversation");
}

#[tokio::test]
async fn staff_messages_store_collapsed_roles_but_display_real_ones() {
    let db = new_test_db().await;
    let api = ChatApi::new(db.clone(), Default::default());
    let conversation = api.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();

    let response = api
        .send_message(
            "manager-1",
            Role::Manager,
            MessageDestination::Conversation(conversation.id.clone()),
            "We will look into it".to_string(),
            None,
        )
        .await
        .expect("Send failed");

    // Storage collapses to the two-value vocabulary; the response keeps the real role.
    assert_eq!(response.message.sender_role, StoredRole::SalesRep);
    assert_eq!(response.display_role, Role::Manager);

    let stored = api.messages(&conversation.id, 50, 0).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sender_role, StoredRole::SalesRep);

    let conversation = db.fetch_conversation(&conversation.id).await.unwrap().unwrap();
    assert!(conversation.last_message_at.is_some(), "sending must refresh the last-activity marker");
    // Staff messages do not bump the supplier-side unread counter.
    assert_eq!(conversation.unread_count, 0);
}

#[tokio::test]
async fn consumer_messages_bump_unread_until_read() {
    let db = new_test_db().await;
    let api = ChatApi::new(db.clone(), Default::default());
    let conversation = api.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();

    for text in ["Where is my order?", "Hello?"] {
        api.send_message(
            "consumer-1",
            Role::Consumer,
            MessageDestination::Conversation(conversation.id.clone()),
            text.to_string(),
            None,
        )
        .await
        .unwrap();
    }
    let refreshed = db.fetch_conversation(&conversation.id).await.unwrap().unwrap();
    assert_eq!(refreshed.unread_count, 2);

    let marked = api.mark_read(&conversation.id, "rep-1", Role::SalesRep).await.unwrap();
    assert_eq!(marked, 2);
    let messages = api.messages(&conversation.id, 50, 0).await.unwrap();
    assert!(messages.iter().all(|m| m.is_read));
}

#[tokio::test]
async fn sending_by_pair_creates_the_conversation_on_first_contact() {
    let db = new_test_db().await;
    let api = ChatApi::new(db, Default::default());
    let response = api
        .send_message(
            "consumer-7",
            Role::Consumer,
            MessageDestination::Pair { consumer_id: "consumer-7".to_string(), supplier_id: "supplier-3".to_string() },
            "First contact".to_string(),
            Some("/uploads/site-photo.jpeg".to_string()),
        )
        .await
        .unwrap();
    let conversation = api.get_or_create_conversation("consumer-7", "supplier-3").await.unwrap();
    assert_eq!(response.message.conversation_id, conversation.id);
    assert_eq!(response.kind.to_string(), "image");
}

#[tokio::test]
async fn escalation_flips_status_and_writes_the_system_message_atomically() {
    let db = new_test_db().await;
    let chat = ChatApi::new(db.clone(), Default::default());
    let api = ComplaintApi::new(db.clone(), Default::default());
    let conversation = chat.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();

    let complaint = api.create_complaint(complaint_for(&conversation.id)).await.unwrap();
    assert_eq!(complaint.status, ComplaintStatus::Open);

    let escalated = api.escalate_complaint(&complaint.id, "rep-9").await.expect("Escalation failed");
    assert_eq!(escalated.status, ComplaintStatus::Escalated);
    assert_eq!(escalated.escalated_by.as_deref(), Some("rep-9"));
    assert!(escalated.escalated_at.is_some());

    let messages = chat.messages(&conversation.id, 50, 0).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, ESCALATION_MESSAGE);
    assert_eq!(messages[0].sender_role, StoredRole::SalesRep);
    assert_eq!(messages[0].sender_id, "rep-9");

    let conversation = db.fetch_conversation(&conversation.id).await.unwrap().unwrap();
    assert!(conversation.last_message_at.is_some());
}

#[tokio::test]
async fn escalating_a_missing_complaint_fails_cleanly() {
    let db = new_test_db().await;
    let api = ComplaintApi::new(db, Default::default());
    let err = api.escalate_complaint("no-such-complaint", "rep-1").await.expect_err("Escalated thin air");
    assert!(matches!(err, ChatGatewayError::ComplaintNotFound(_)), "got {err}");
}

#[tokio::test]
async fn resolution_length_boundary_sits_at_ten_characters() {
    let db = new_test_db().await;
    let chat = ChatApi::new(db.clone(), Default::default());
    let api = ComplaintApi::new(db, Default::default());
    let conversation = chat.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();
    let complaint = api.create_complaint(complaint_for(&conversation.id)).await.unwrap();

    let err = api.resolve_complaint(&complaint.id, "123456789").await.expect_err("Nine characters accepted");
    assert!(matches!(err, ChatGatewayError::ResolutionTooShort { minimum: 10, actual: 9 }), "got {err}");

    let resolved = api.resolve_complaint(&complaint.id, "1234567890").await.expect("Ten characters rejected");
    assert_eq!(resolved.status, ComplaintStatus::Resolved);
    assert_eq!(resolved.resolution.as_deref(), Some("1234567890"));
    assert!(resolved.resolved_at.is_some());
}

#[tokio::test]
async fn resolution_is_reachable_from_escalated_but_not_twice() {
    let db = new_test_db().await;
    let chat = ChatApi::new(db.clone(), Default::default());
    let api = ComplaintApi::new(db, Default::default());
    let conversation = chat.get_or_create_conversation("consumer-1", "supplier-1").await.unwrap();
    let complaint = api.create_complaint(complaint_for(&conversation.id)).await.unwrap();

    api.escalate_complaint(&complaint.id, "rep-9").await.unwrap();
    let resolved = api.resolve_complaint(&complaint.id, "Replacement shipment sent").await.unwrap();
    assert_eq!(resolved.status, ComplaintStatus::Resolved);

    let err = api.resolve_complaint(&complaint.id, "Resolved once more").await.expect_err("Double resolution");
    assert!(matches!(err, ChatGatewayError::ComplaintAlreadyResolved(_)), "got {err}");
}
