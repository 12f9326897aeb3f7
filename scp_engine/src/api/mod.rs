//! # The engine's public API
//!
//! The request-facing surface of the engine. Each API struct is generic over a database backend trait and owns a set
//! of [`crate::events::EventProducers`] so that committed state changes can be announced to subscribers (the live
//! connection hub, typically) without the caller waiting on them.
//!
//! * [`OrderFlowApi`] — order creation and the accept/reject/cancel lifecycle.
//! * [`ChatApi`] — conversations and messages.
//! * [`ComplaintApi`] — complaint filing, escalation and resolution.
pub mod chat_api;
pub mod chat_objects;
pub mod complaint_api;
pub mod order_flow_api;
pub mod order_objects;

pub use chat_api::ChatApi;
pub use complaint_api::{ComplaintApi, MIN_RESOLUTION_LENGTH};
pub use order_flow_api::OrderFlowApi;
