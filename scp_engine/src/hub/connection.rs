use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;
use tokio::sync::mpsc;

use crate::db_types::Role;

/// Default capacity of a connection's outbound queue. A peer that falls this many messages behind is evicted.
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// Separator between messages coalesced into a single network frame.
const MESSAGE_SEPARATOR: u8 = b'\n';

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The hub's view of one live connection: who is on the other end, and the sending half of its outbound queue.
///
/// Dropping the handle closes the queue, which the outbound pump observes as a request to close the connection
/// gracefully.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub connection_id: u64,
    pub user_id: String,
    pub role: Role,
    pub supplier_id: Option<String>,
    pub queue: mpsc::Sender<Vec<u8>>,
}

impl ClientHandle {
    pub fn new(
        user_id: String,
        role: Role,
        supplier_id: Option<String>,
        queue: mpsc::Sender<Vec<u8>>,
    ) -> Self {
        let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        Self { connection_id, user_id, role, supplier_id, queue }
    }
}

/// Creates the bounded outbound queue for a single connection.
pub fn outbound_channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
    mpsc::channel(capacity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Destination for outbound frames. The transport layer implements this over whatever socket it manages; the engine
/// only needs to hand frames over and signal a graceful close.
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    /// Writes one frame. An error means the peer is gone; the pump stops without attempting a graceful close.
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), SinkClosed>;

    /// Closes the connection gracefully (a close frame, where the transport has one).
    async fn close(&mut self);
}

/// The outbound write duty of a connection: drains the private queue to the sink for as long as the queue is open.
///
/// All messages that are queued at a single write opportunity are coalesced into one frame, separated by `\n`, before
/// flushing. Per-connection FIFO order is preserved — there is exactly one pump per queue. When the queue closes
/// (the hub evicted or unregistered the connection) the sink is closed gracefully; when a write fails the pump just
/// stops, and the read side tears the connection down.
pub async fn run_outbound_pump<S: FrameSink>(mut queue: mpsc::Receiver<Vec<u8>>, sink: &mut S) {
    while let Some(first) = queue.recv().await {
        let mut frame = first;
        let mut coalesced = 0usize;
        while let Ok(next) = queue.try_recv() {
            frame.push(MESSAGE_SEPARATOR);
            frame.extend_from_slice(&next);
            coalesced += 1;
        }
        if coalesced > 0 {
            trace!("🔌️ Coalesced {} queued messages into one frame", coalesced + 1);
        }
        if sink.send_frame(frame).await.is_err() {
            return;
        }
    }
    sink.close().await;
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub frames: Vec<Vec<u8>>,
        pub closed: bool,
        pub fail_writes: bool,
    }

    impl FrameSink for RecordingSink {
        async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), SinkClosed> {
            if self.fail_writes {
                return Err(SinkClosed);
            }
            self.frames.push(frame);
            Ok(())
        }

        async fn close(&mut self) {
            self.closed = true;
        }
    }

    #[tokio::test]
    async fn queued_messages_coalesce_into_one_frame() {
        let (tx, rx) = outbound_channel(8);
        tx.send(b"one".to_vec()).await.unwrap();
        tx.send(b"two".to_vec()).await.unwrap();
        tx.send(b"three".to_vec()).await.unwrap();
        drop(tx);
        let mut sink = RecordingSink::default();
        run_outbound_pump(rx, &mut sink).await;
        assert_eq!(sink.frames, vec![b"one\ntwo\nthree".to_vec()]);
        assert!(sink.closed, "queue closure should close the sink gracefully");
    }

    #[tokio::test]
    async fn write_failure_stops_the_pump_without_graceful_close() {
        let (tx, rx) = outbound_channel(8);
        tx.send(b"doomed".to_vec()).await.unwrap();
        drop(tx);
        let mut sink = RecordingSink { fail_writes: true, ..Default::default() };
        run_outbound_pump(rx, &mut sink).await;
        assert!(sink.frames.is_empty());
        assert!(!sink.closed);
    }

    #[tokio::test]
    async fn messages_sent_while_pump_waits_arrive_in_order() {
        let (tx, rx) = outbound_channel(8);
        let pump = tokio::spawn(async move {
            let mut sink = RecordingSink::default();
            run_outbound_pump(rx, &mut sink).await;
            sink
        });
        for payload in [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()] {
            tx.send(payload).await.unwrap();
            tokio::task::yield_now().await;
        }
        drop(tx);
        let sink = pump.await.unwrap();
        let flat: Vec<u8> = sink.frames.join(&MESSAGE_SEPARATOR);
        assert_eq!(flat, b"a\nb\nc".to_vec());
    }
}
