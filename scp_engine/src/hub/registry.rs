use std::collections::HashMap;

use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::connection::ClientHandle;
use crate::db_types::Role;

/// The envelope every live notification is wrapped in before it goes over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

impl PushMessage {
    pub fn new<T: Serialize>(kind: &str, data: &T) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            error!("🔌️ Could not serialize payload for push message '{kind}': {e}");
            serde_json::Value::Null
        });
        Self { kind: kind.to_string(), data }
    }
}

enum HubCommand {
    Register(ClientHandle),
    Unregister(u64),
    SendToUser { user_id: String, payload: Vec<u8> },
    SendToSupplier { supplier_id: String, payload: Vec<u8> },
    SendToConsumer { consumer_id: String, payload: Vec<u8> },
    Broadcast { payload: Vec<u8> },
}

/// The single owner of the live connection set.
///
/// Run [`LiveHub::run`] in its own task and talk to it exclusively through the [`HubHandle`] — the set itself is
/// never shared. Commands are processed strictly serially, so a registration is observable to every send submitted
/// after it.
pub struct LiveHub {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    clients: HashMap<u64, ClientHandle>,
}

impl LiveHub {
    pub fn new() -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self { commands: rx, clients: HashMap::new() };
        (hub, HubHandle { commands: tx })
    }

    /// Creates a hub, spawns its control loop and returns the handle. The loop runs until the last handle is
    /// dropped.
    pub fn spawn() -> HubHandle {
        let (hub, handle) = Self::new();
        tokio::spawn(hub.run());
        handle
    }

    pub async fn run(mut self) {
        debug!("🔌️ Connection hub started");
        while let Some(cmd) = self.commands.recv().await {
            self.handle(cmd);
        }
        debug!("🔌️ Connection hub shutting down");
    }

    fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register(client) => {
                info!("🔌️ Client connected: {} (role: {})", client.user_id, client.role);
                self.clients.insert(client.connection_id, client);
            },
            HubCommand::Unregister(connection_id) => {
                // Idempotent: eviction may already have removed the entry.
                if let Some(client) = self.clients.remove(&connection_id) {
                    info!("🔌️ Client disconnected: {}", client.user_id);
                }
            },
            HubCommand::SendToUser { user_id, payload } => {
                self.deliver(|c| c.user_id == user_id, payload);
            },
            HubCommand::SendToSupplier { supplier_id, payload } => {
                self.deliver(|c| c.supplier_id.as_deref() == Some(supplier_id.as_str()), payload);
            },
            HubCommand::SendToConsumer { consumer_id, payload } => {
                self.deliver(|c| c.user_id == consumer_id && c.role == Role::Consumer, payload);
            },
            HubCommand::Broadcast { payload } => {
                self.deliver(|_| true, payload);
            },
        }
    }

    /// Pushes the payload onto the queue of every matching connection. The push never waits: a connection whose
    /// queue is full (or whose pump is gone) is treated as dead and removed, closing its queue.
    fn deliver<F: Fn(&ClientHandle) -> bool>(&mut self, filter: F, payload: Vec<u8>) {
        let mut dead = Vec::new();
        for client in self.clients.values().filter(|c| filter(c)) {
            if client.queue.try_send(payload.clone()).is_err() {
                dead.push(client.connection_id);
            }
        }
        for connection_id in dead {
            if let Some(client) = self.clients.remove(&connection_id) {
                warn!("🔌️ Connection {connection_id} for {} cannot keep up; evicting", client.user_id);
            }
        }
    }

    #[cfg(test)]
    fn client_count(&self) -> usize {
        self.clients.len()
    }
}

/// Clonable entry point to the hub. All operations are non-blocking: they enqueue a command for the hub task and
/// return immediately.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn register(&self, client: ClientHandle) {
        self.submit(HubCommand::Register(client));
    }

    pub fn unregister(&self, connection_id: u64) {
        self.submit(HubCommand::Unregister(connection_id));
    }

    /// Delivers to every live connection authenticated as `user_id` — a user may be connected from several devices.
    pub fn send_to_user(&self, user_id: &str, message: PushMessage) {
        if let Some(payload) = self.serialize(&message) {
            self.submit(HubCommand::SendToUser { user_id: user_id.to_string(), payload });
        }
    }

    /// Delivers to every connected staff member of the given supplier.
    pub fn send_to_supplier(&self, supplier_id: &str, message: PushMessage) {
        if let Some(payload) = self.serialize(&message) {
            self.submit(HubCommand::SendToSupplier { supplier_id: supplier_id.to_string(), payload });
        }
    }

    /// Delivers to connections authenticated as `consumer_id` that also declared the consumer role, so a staff
    /// member who happens to share an identifier is never addressed.
    pub fn send_to_consumer(&self, consumer_id: &str, message: PushMessage) {
        if let Some(payload) = self.serialize(&message) {
            self.submit(HubCommand::SendToConsumer { consumer_id: consumer_id.to_string(), payload });
        }
    }

    pub fn broadcast(&self, message: PushMessage) {
        if let Some(payload) = self.serialize(&message) {
            self.broadcast_raw(payload);
        }
    }

    pub fn broadcast_raw(&self, payload: Vec<u8>) {
        self.submit(HubCommand::Broadcast { payload });
    }

    fn serialize(&self, message: &PushMessage) -> Option<Vec<u8>> {
        match serde_json::to_vec(message) {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!("🔌️ Error marshaling push message: {e}");
                None
            },
        }
    }

    fn submit(&self, cmd: HubCommand) {
        if self.commands.send(cmd).is_err() {
            debug!("🔌️ Connection hub is gone; dropping command");
        }
    }
}

#[cfg(test)]
mod test {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::hub::outbound_channel;

    fn connect(hub: &mut LiveHub, user_id: &str, role: Role, supplier_id: Option<&str>, capacity: usize) -> (u64, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = outbound_channel(capacity);
        let client = ClientHandle::new(user_id.to_string(), role, supplier_id.map(String::from), tx);
        let id = client.connection_id;
        hub.handle(HubCommand::Register(client));
        (id, rx)
    }

    fn payload(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn send_to_user_reaches_every_device_and_nobody_else() {
        let (mut hub, _handle) = LiveHub::new();
        let (_, mut phone) = connect(&mut hub, "alice", Role::Consumer, None, 4);
        let (_, mut laptop) = connect(&mut hub, "alice", Role::Consumer, None, 4);
        let (_, mut other) = connect(&mut hub, "bob", Role::Consumer, None, 4);
        hub.handle(HubCommand::SendToUser { user_id: "alice".to_string(), payload: payload("hi") });
        assert_eq!(phone.try_recv().unwrap(), payload("hi"));
        assert_eq!(laptop.try_recv().unwrap(), payload("hi"));
        assert_eq!(other.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn send_to_supplier_filters_by_affiliation() {
        let (mut hub, _handle) = LiveHub::new();
        let (_, mut rep) = connect(&mut hub, "rep-1", Role::SalesRep, Some("supplier-9"), 4);
        let (_, mut owner) = connect(&mut hub, "owner-1", Role::Owner, Some("supplier-9"), 4);
        let (_, mut rival) = connect(&mut hub, "rep-2", Role::SalesRep, Some("supplier-7"), 4);
        hub.handle(HubCommand::SendToSupplier { supplier_id: "supplier-9".to_string(), payload: payload("order") });
        assert!(rep.try_recv().is_ok());
        assert!(owner.try_recv().is_ok());
        assert_eq!(rival.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn send_to_consumer_requires_the_consumer_role() {
        let (mut hub, _handle) = LiveHub::new();
        let (_, mut consumer) = connect(&mut hub, "x-1", Role::Consumer, None, 4);
        let (_, mut staff_same_id) = connect(&mut hub, "x-1", Role::SalesRep, Some("supplier-9"), 4);
        hub.handle(HubCommand::SendToConsumer { consumer_id: "x-1".to_string(), payload: payload("ping") });
        assert!(consumer.try_recv().is_ok());
        assert_eq!(staff_same_id.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn saturated_connection_is_evicted_not_waited_on() {
        let (mut hub, _handle) = LiveHub::new();
        let (_, mut slow) = connect(&mut hub, "slow", Role::Consumer, None, 1);
        let (_, mut healthy) = connect(&mut hub, "healthy", Role::Consumer, None, 4);
        hub.handle(HubCommand::Broadcast { payload: payload("1") });
        // The slow peer never drains; the second broadcast overflows its queue and evicts it.
        hub.handle(HubCommand::Broadcast { payload: payload("2") });
        assert_eq!(hub.client_count(), 1);
        // Its queue is closed after the buffered message is drained.
        assert_eq!(slow.try_recv().unwrap(), payload("1"));
        assert_eq!(slow.try_recv(), Err(TryRecvError::Disconnected));
        // The healthy connection keeps receiving.
        hub.handle(HubCommand::Broadcast { payload: payload("3") });
        assert_eq!(healthy.try_recv().unwrap(), payload("1"));
        assert_eq!(healthy.try_recv().unwrap(), payload("2"));
        assert_eq!(healthy.try_recv().unwrap(), payload("3"));
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let (mut hub, _handle) = LiveHub::new();
        let (id, mut rx) = connect(&mut hub, "carol", Role::Consumer, None, 4);
        hub.handle(HubCommand::Unregister(id));
        hub.handle(HubCommand::Unregister(id));
        assert_eq!(hub.client_count(), 0);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn handle_round_trip_through_the_spawned_loop() {
        let handle = LiveHub::spawn();
        let (tx, mut rx) = outbound_channel(4);
        let client = ClientHandle::new("dave".to_string(), Role::Consumer, None, tx);
        handle.register(client);
        handle.send_to_user("dave", PushMessage::new("greeting", &serde_json::json!({"text": "hello"})));
        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("queue closed unexpectedly");
        let envelope: PushMessage = serde_json::from_slice(&frame).unwrap();
        assert_eq!(envelope.kind, "greeting");
        assert_eq!(envelope.data["text"], "hello");
    }
}
