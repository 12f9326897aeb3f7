use std::fmt::Display;

use scp_engine::db_types::ComplaintPriority;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Standard `?page=&page_size=` query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: default_page(), page_size: default_page_size() }
    }
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

/// Body of `POST /conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageParams {
    pub content: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

/// Body of `POST /messages` — addressed by counterparty instead of conversation id. Consumers name a supplier;
/// staff name a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageToPairParams {
    pub content: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub consumer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComplaintParams {
    pub conversation_id: String,
    pub consumer_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: ComplaintPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveComplaintParams {
    pub resolution: String,
}
