use serde::Serialize;

use crate::{
    db_types::{Message, Role},
    helpers::{classify_attachment, AttachmentKind},
};

/// Where a message should go: an existing conversation, or the (consumer, supplier) pair — which creates the
/// conversation on first contact.
#[derive(Debug, Clone)]
pub enum MessageDestination {
    Conversation(String),
    Pair { consumer_id: String, supplier_id: String },
}

/// The outward-facing shape of a stored message.
///
/// `display_role` is the sender's actual organisational role. Storage only keeps the collapsed two-value vocabulary
/// (see [`crate::db_types::StoredRole`]), so this is the one place a manager still looks like a manager.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub message: Message,
    pub display_role: Role,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
}

impl MessageResponse {
    pub fn new(message: Message, display_role: Role) -> Self {
        let kind = classify_attachment(message.attachment_url.as_deref());
        Self { message, display_role, kind }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::StoredRole;

    fn message(attachment_url: Option<&str>) -> Message {
        Message {
            id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            sender_id: "u1".to_string(),
            sender_role: StoredRole::SalesRep,
            content: "hello".to_string(),
            attachment_url: attachment_url.map(String::from),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_role_survives_collapsed_storage() {
        let response = MessageResponse::new(message(None), Role::Manager);
        assert_eq!(response.message.sender_role, StoredRole::SalesRep);
        assert_eq!(response.display_role, Role::Manager);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sender_role"], "sales_rep");
        assert_eq!(json["display_role"], "manager");
    }

    #[test]
    fn message_kind_follows_the_attachment() {
        assert_eq!(MessageResponse::new(message(None), Role::Consumer).kind, AttachmentKind::Text);
        assert_eq!(MessageResponse::new(message(Some("/uploads/a.png")), Role::Consumer).kind, AttachmentKind::Image);
        assert_eq!(MessageResponse::new(message(Some("/uploads/a.zip")), Role::Consumer).kind, AttachmentKind::File);
    }
}
