use thiserror::Error;

use crate::db_types::{Complaint, Conversation, Message, NewComplaint, NewMessage};

/// The fixed system-style message appended to a conversation when a complaint is escalated.
pub const ESCALATION_MESSAGE: &str = "this problem escalated to manager";

/// This trait defines the persistence behaviour for conversations, messages and complaints.
///
/// The two invariants backends must uphold:
/// * exactly one conversation per (consumer, supplier) pair — [`Self::get_or_create_conversation`] must be idempotent
///   under concurrent first-contacts, and
/// * complaint escalation writes the status change, the escalation message and the conversation's last-activity
///   marker atomically.
#[allow(async_fn_in_trait)]
pub trait ChatGatewayDatabase: Clone {
    /// Returns the conversation for the (consumer, supplier) pair, creating it first if it does not exist. Safe to
    /// call concurrently: a lost insert race falls back to reading the winner's row.
    async fn get_or_create_conversation(
        &self,
        consumer_id: &str,
        supplier_id: &str,
    ) -> Result<Conversation, ChatGatewayError>;

    /// Fetches a conversation by id, or `None` if it does not exist.
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>, ChatGatewayError>;

    /// All conversations the given consumer participates in, most recent activity first.
    async fn conversations_for_consumer(&self, consumer_id: &str) -> Result<Vec<Conversation>, ChatGatewayError>;

    /// All conversations belonging to the given supplier, most recent activity first.
    async fn conversations_for_supplier(&self, supplier_id: &str) -> Result<Vec<Conversation>, ChatGatewayError>;

    /// Stores a message and, in the same transaction, refreshes the conversation's last-activity marker (and bumps
    /// the supplier-side unread counter for consumer senders). Returns the stored message.
    async fn create_message(&self, message: NewMessage) -> Result<Message, ChatGatewayError>;

    /// Messages in the conversation, oldest first.
    async fn messages_for_conversation(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, ChatGatewayError>;

    /// Marks every message in the conversation that was NOT sent by `reader_id` as read, and resets the unread
    /// counter when the reader is the consumer side. Returns the number of messages newly marked.
    async fn mark_messages_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
        reader_is_consumer: bool,
    ) -> Result<u64, ChatGatewayError>;

    /// Stores a new complaint with status `open`.
    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, ChatGatewayError>;

    /// Fetches a complaint by id, or `None` if it does not exist.
    async fn fetch_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>, ChatGatewayError>;

    /// All complaints filed against the given supplier, newest first.
    async fn complaints_for_supplier(&self, supplier_id: &str) -> Result<Vec<Complaint>, ChatGatewayError>;

    /// Escalates the complaint. In ONE transaction:
    /// * status becomes `escalated`, recording the acting staff member and the time,
    /// * the fixed [`ESCALATION_MESSAGE`] is appended to the linked conversation, authored by the staff member under
    ///   the collapsed `sales_rep` role, and
    /// * the conversation's last-activity marker is refreshed.
    ///
    /// If any of the three writes fails, none of them is visible.
    async fn escalate_complaint(
        &self,
        complaint_id: &str,
        staff_id: &str,
    ) -> Result<(Complaint, Message), ChatGatewayError>;

    /// Resolves the complaint, storing the resolution text and timestamp. Reachable from `open` or `escalated`.
    /// Resolution length validation happens at the API layer.
    async fn resolve_complaint(&self, complaint_id: &str, resolution: &str) -> Result<Complaint, ChatGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum ChatGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested conversation {0} does not exist")]
    ConversationNotFound(String),
    #[error("The requested complaint {0} does not exist")]
    ComplaintNotFound(String),
    #[error("Resolution must be at least {minimum} characters, got {actual}")]
    ResolutionTooShort { minimum: usize, actual: usize },
    #[error("Complaint {0} has already been resolved")]
    ComplaintAlreadyResolved(String),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
}

impl From<sqlx::Error> for ChatGatewayError {
    fn from(e: sqlx::Error) -> Self {
        ChatGatewayError::DatabaseError(e.to_string())
    }
}
