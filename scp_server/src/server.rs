use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use log::*;
use scp_engine::{
    db_types::{OrderStatusType, StoredRole},
    events::{EventHandlers, EventHooks, EventProducers},
    hub::{HubHandle, LiveHub, PushMessage},
    sqlite,
    ChatApi,
    ComplaintApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AcceptOrderRoute,
        CancelOrderRoute,
        ComplaintByIdRoute,
        ConversationMessagesRoute,
        CreateComplaintRoute,
        CreateOrderRoute,
        EscalateComplaintRoute,
        MarkReadRoute,
        MyComplaintsRoute,
        MyConversationsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        RejectOrderRoute,
        ResolveComplaintRoute,
        SendMessageRoute,
        SendMessageToPairRoute,
        UpdateProductRoute,
    },
    ws,
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        sqlite::run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🚀️ Database migrations are up to date");
    }
    let hub = LiveHub::spawn();
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, live_notification_hooks(hub.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers, hub)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    hub: HubHandle,
) -> Result<Server, ServerError> {
    let bind_address = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::with_policy(db.clone(), config.pricing_policy(), producers.clone());
        let chat_api = ChatApi::new(db.clone(), producers.clone());
        let complaint_api = ComplaintApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("scp::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(chat_api))
            .app_data(web::Data::new(complaint_api))
            .app_data(web::Data::new(hub.clone()))
            .app_data(web::Data::new(config.clone()));
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AcceptOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(MyConversationsRoute::<SqliteDatabase>::new())
            .service(ConversationMessagesRoute::<SqliteDatabase>::new())
            .service(SendMessageRoute::<SqliteDatabase>::new())
            .service(SendMessageToPairRoute::<SqliteDatabase>::new())
            .service(MarkReadRoute::<SqliteDatabase>::new())
            .service(CreateComplaintRoute::<SqliteDatabase>::new())
            .service(MyComplaintsRoute::<SqliteDatabase>::new())
            .service(ComplaintByIdRoute::<SqliteDatabase>::new())
            .service(EscalateComplaintRoute::<SqliteDatabase>::new())
            .service(ResolveComplaintRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).route("/ws", web::get().to(ws::websocket_entry))
    })
    .bind(bind_address)?
    .run();
    Ok(srv)
}

/// Wires the engine's event hooks to the live connection hub.
///
/// Delivery is best effort by construction: hooks run after the durable write has committed, on their own tasks, and
/// a failed or dropped notification never surfaces to the request that caused it.
pub fn live_notification_hooks(hub: HubHandle) -> EventHooks {
    let mut hooks = EventHooks::default();
    let h = hub.clone();
    hooks.on_order_created(move |ev| {
        let h = h.clone();
        Box::pin(async move {
            h.send_to_supplier(&ev.order.supplier_id, PushMessage::new("order_created", &ev.order));
        })
    });
    let h = hub.clone();
    hooks.on_order_accepted(move |ev| {
        let h = h.clone();
        Box::pin(async move {
            h.send_to_consumer(&ev.order.consumer_id, PushMessage::new("order_accepted", &ev.order));
        })
    });
    let h = hub.clone();
    hooks.on_order_annulled(move |ev| {
        let h = h.clone();
        Box::pin(async move {
            match ev.status {
                // A rejection is news to the consumer; a cancellation is news to the supplier's staff.
                OrderStatusType::Rejected => {
                    h.send_to_consumer(&ev.order.consumer_id, PushMessage::new("order_rejected", &ev.order));
                },
                OrderStatusType::Cancelled => {
                    h.send_to_supplier(&ev.order.supplier_id, PushMessage::new("order_cancelled", &ev.order));
                },
                _ => {},
            }
        })
    });
    let h = hub.clone();
    hooks.on_message_sent(move |ev| {
        let h = h.clone();
        Box::pin(async move {
            let payload = PushMessage::new("new_message", &ev.message);
            match ev.message.sender_role {
                StoredRole::Consumer => h.send_to_supplier(&ev.conversation.supplier_id, payload),
                StoredRole::SalesRep => h.send_to_consumer(&ev.conversation.consumer_id, payload),
            }
        })
    });
    let h = hub;
    hooks.on_complaint_escalated(move |ev| {
        let h = h.clone();
        Box::pin(async move {
            h.send_to_supplier(&ev.complaint.supplier_id, PushMessage::new("complaint_escalated", &ev.complaint));
        })
    });
    hooks
}
