use std::fmt::Debug;

use log::*;

use crate::{
    api::chat_objects::{MessageDestination, MessageResponse},
    db_types::{Conversation, Message, NewMessage, Role, StoredRole},
    events::{EventProducers, MessageSentEvent},
    traits::{ChatGatewayDatabase, ChatGatewayError},
};

/// `ChatApi` binds conversations to consumer-supplier pairs and handles message creation.
pub struct ChatApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ChatApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatApi")
    }
}

impl<B> ChatApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ChatApi<B>
where B: ChatGatewayDatabase
{
    /// Returns the single conversation for the pair, creating it on first contact. Idempotent under concurrent
    /// callers: everyone gets the same conversation back.
    pub async fn get_or_create_conversation(
        &self,
        consumer_id: &str,
        supplier_id: &str,
    ) -> Result<Conversation, ChatGatewayError> {
        self.db.get_or_create_conversation(consumer_id, supplier_id).await
    }

    pub async fn conversations_for_consumer(&self, consumer_id: &str) -> Result<Vec<Conversation>, ChatGatewayError> {
        self.db.conversations_for_consumer(consumer_id).await
    }

    pub async fn conversations_for_supplier(&self, supplier_id: &str) -> Result<Vec<Conversation>, ChatGatewayError> {
        self.db.conversations_for_supplier(supplier_id).await
    }

    /// Stores a message from `sender_id` and returns its outward-facing shape.
    ///
    /// The sender's organisational role is collapsed to the two-value storage vocabulary before persisting; the
    /// response still carries the original role. The conversation's last-activity marker is refreshed in the same
    /// transaction as the message insert.
    pub async fn send_message(
        &self,
        sender_id: &str,
        sender_role: Role,
        destination: MessageDestination,
        content: String,
        attachment_url: Option<String>,
    ) -> Result<MessageResponse, ChatGatewayError> {
        let conversation = match destination {
            MessageDestination::Conversation(id) => self
                .db
                .fetch_conversation(&id)
                .await?
                .ok_or(ChatGatewayError::ConversationNotFound(id))?,
            MessageDestination::Pair { consumer_id, supplier_id } => {
                self.db.get_or_create_conversation(&consumer_id, &supplier_id).await?
            },
        };
        let message = NewMessage {
            conversation_id: conversation.id.clone(),
            sender_id: sender_id.to_string(),
            sender_role: StoredRole::from(sender_role),
            content,
            attachment_url,
        };
        let message = self.db.create_message(message).await?;
        debug!("💬️ Message {} sent by {sender_id} ({sender_role}) in conversation {}", message.id, conversation.id);
        self.call_message_sent_hook(&conversation, &message).await;
        Ok(MessageResponse::new(message, sender_role))
    }

    pub async fn messages(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, ChatGatewayError> {
        self.db.messages_for_conversation(conversation_id, limit, offset).await
    }

    /// Marks everything the reader has not written as read. Consumers also get their unread counter reset.
    pub async fn mark_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
        reader_role: Role,
    ) -> Result<u64, ChatGatewayError> {
        let marked = self
            .db
            .mark_messages_read(conversation_id, reader_id, reader_role == Role::Consumer)
            .await?;
        trace!("💬️ {marked} messages marked read in conversation {conversation_id} by {reader_id}");
        Ok(marked)
    }

    async fn call_message_sent_hook(&self, conversation: &Conversation, message: &Message) {
        for emitter in &self.producers.message_sent_producer {
            trace!("💬️ Notifying message sent hook subscribers");
            emitter.publish_event(MessageSentEvent::new(conversation.clone(), message.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
