//! # Database management and control.
//!
//! This module provides the interface contracts of the platform's database *backends*, plus the bundled SQLite
//! implementation.
//!
//! ## Traits
//! * [`traits::OrderGatewayDatabase`] covers products, order creation and the order lifecycle transitions, including
//!   the atomic conditional stock decrement that guards against overselling.
//! * [`traits::ChatGatewayDatabase`] covers conversations, messages and complaints, including the race-tolerant
//!   conversation get-or-create and the transactional complaint escalation.
//!
//! You should never need to access the database directly; use the public APIs in [`crate::api`]. The exception is the
//! data types used in the database, which are defined in [`crate::db_types`] and are public.
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod traits;
