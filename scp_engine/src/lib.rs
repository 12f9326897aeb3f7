//! SCP Engine
//!
//! Core library for the SCP supply-chain ordering platform: consumers place orders against supplier catalogs, chat
//! with suppliers and file complaints; suppliers decide orders and respond. This crate is provider-agnostic — it
//! contains the engine logic, not the HTTP surface.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the bundled backend. You should never need to access
//!    the database directly; use the public APIs instead. The exception is the data types used in the database,
//!    which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@api`]): [`OrderFlowApi`] for the order lifecycle, [`ChatApi`] and
//!    [`ComplaintApi`] for conversations and complaints. Backends implement the traits in [`mod@traits`] to plug in.
//! 3. Live delivery ([`mod@hub`]): the connection registry that fans committed state changes out to connected
//!    clients, fed through the event hooks in [`mod@events`].
mod api;
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod hub;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite;
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use api::{chat_objects, order_objects, ChatApi, ComplaintApi, OrderFlowApi, MIN_RESOLUTION_LENGTH};
pub use db::traits;
