//! # Live connection hub
//!
//! Tracks the set of currently connected clients and fans live notifications out to them: to one user (all of their
//! devices), to every staff member of a supplier, to a consumer specifically, or to everyone.
//!
//! A single [`LiveHub`] task exclusively owns the connection set. Every mutation and every addressed send arrives
//! through one command channel, so the set needs no locks and can never be observed mid-update. Delivery to an
//! individual connection is a non-blocking push onto that connection's bounded outbound queue; a connection whose
//! queue is full is presumed dead and is evicted on the spot. Live notifications are best effort — the durable record
//! of whatever they announce is already in the database by the time they are sent.
mod connection;
mod registry;

pub use connection::{outbound_channel, run_outbound_pump, ClientHandle, FrameSink, SinkClosed, DEFAULT_QUEUE_SIZE};
pub use registry::{HubHandle, LiveHub, PushMessage};
