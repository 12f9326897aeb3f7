//! WebSocket entry point and session actor.
//!
//! The session actor is the inbound read duty of a live connection: it answers pings, tracks peer liveness via a
//! heartbeat, and unregisters the connection from the hub on any close or failure. The outbound write duty runs as a
//! separate task — the engine's outbound pump — which drains the connection's queue and hands finished frames to the
//! session through its actor address.
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::*;
use scp_engine::hub::{outbound_channel, run_outbound_pump, ClientHandle, FrameSink, HubHandle, SinkClosed};

use crate::{auth::AuthClaims, config::ServerConfig, errors::ServerError};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WsSession {
    connection_id: u64,
    user_id: String,
    hub: HubHandle,
    hb: Instant,
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Idempotent: the hub may already have evicted this connection.
        self.hub.unregister(self.connection_id);
        debug!("💻️ WebSocket session for {} ended", self.user_id);
    }
}

impl WsSession {
    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!("💻️ Heartbeat timeout for {}; disconnecting", act.user_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            },
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            },
            Ok(ws::Message::Text(text)) => {
                // Clients only listen on this channel; inbound frames are logged and dropped.
                debug!("💻️ Received message from {}: {text}", self.user_id);
            },
            Ok(ws::Message::Binary(_)) => {},
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            },
            Ok(_) => {},
            Err(e) => {
                warn!("💻️ WebSocket error for {}: {e}", self.user_id);
                ctx.stop();
            },
        }
    }
}

/// A finished frame from the outbound pump, ready to write to the socket.
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct OutboundFrame(pub Vec<u8>);

impl Handler<OutboundFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(String::from_utf8_lossy(&msg.0).into_owned());
    }
}

/// The connection's queue has closed; say goodbye properly.
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct CloseSession;

impl Handler<CloseSession> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: CloseSession, ctx: &mut Self::Context) {
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
        ctx.stop();
    }
}

/// Bridges the engine's outbound pump to the session actor. A dead actor reads as a closed sink, which stops the
/// pump.
pub struct SessionSink {
    addr: Addr<WsSession>,
}

impl FrameSink for SessionSink {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), SinkClosed> {
        self.addr.send(OutboundFrame(frame)).await.map_err(|_| SinkClosed)
    }

    async fn close(&mut self) {
        let _ = self.addr.send(CloseSession).await;
    }
}

/// Upgrades an authenticated request to a live connection: registers a handle with the hub, starts the session actor
/// (read duty) and spawns the outbound pump (write duty). Both duties run until the peer disconnects or the hub
/// evicts the connection.
pub async fn websocket_entry(
    req: HttpRequest,
    stream: web::Payload,
    claims: AuthClaims,
    hub: web::Data<HubHandle>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let (queue_tx, queue_rx) = outbound_channel(config.ws_queue_size);
    let client = ClientHandle::new(claims.user_id.clone(), claims.role, claims.supplier_id.clone(), queue_tx);
    let connection_id = client.connection_id;
    let session =
        WsSession { connection_id, user_id: claims.user_id.clone(), hub: hub.get_ref().clone(), hb: Instant::now() };
    let (addr, response) = ws::WsResponseBuilder::new(session, &req, stream)
        .start_with_addr()
        .map_err(|e| ServerError::Unspecified(format!("WebSocket upgrade failed: {e}")))?;
    hub.register(client);
    tokio::spawn(async move {
        let mut sink = SessionSink { addr };
        run_outbound_pump(queue_rx, &mut sink).await;
    });
    Ok(response)
}
