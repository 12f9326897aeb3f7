use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    ComplaintEscalatedEvent,
    EventHandler,
    EventProducer,
    Handler,
    MessageSentEvent,
    OrderAcceptedEvent,
    OrderAnnulledEvent,
    OrderCreatedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_accepted_producer: Vec<EventProducer<OrderAcceptedEvent>>,
    pub order_annulled_producer: Vec<EventProducer<OrderAnnulledEvent>>,
    pub message_sent_producer: Vec<EventProducer<MessageSentEvent>>,
    pub complaint_escalated_producer: Vec<EventProducer<ComplaintEscalatedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_accepted: Option<EventHandler<OrderAcceptedEvent>>,
    pub on_order_annulled: Option<EventHandler<OrderAnnulledEvent>>,
    pub on_message_sent: Option<EventHandler<MessageSentEvent>>,
    pub on_complaint_escalated: Option<EventHandler<ComplaintEscalatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_accepted = hooks.on_order_accepted.map(|f| EventHandler::new(buffer_size, f));
        let on_order_annulled = hooks.on_order_annulled.map(|f| EventHandler::new(buffer_size, f));
        let on_message_sent = hooks.on_message_sent.map(|f| EventHandler::new(buffer_size, f));
        let on_complaint_escalated = hooks.on_complaint_escalated.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_accepted, on_order_annulled, on_message_sent, on_complaint_escalated }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_accepted {
            result.order_accepted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_annulled {
            result.order_annulled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_message_sent {
            result.message_sent_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_complaint_escalated {
            result.complaint_escalated_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_accepted {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_annulled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_message_sent {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_complaint_escalated {
            tokio::spawn(handler.start_handler());
        }
    }
}

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_accepted: Option<Handler<OrderAcceptedEvent>>,
    pub on_order_annulled: Option<Handler<OrderAnnulledEvent>>,
    pub on_message_sent: Option<Handler<MessageSentEvent>>,
    pub on_complaint_escalated: Option<Handler<ComplaintEscalatedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_accepted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAcceptedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_accepted = Some(Arc::new(f));
        self
    }

    pub fn on_order_annulled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAnnulledEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_annulled = Some(Arc::new(f));
        self
    }

    pub fn on_message_sent<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MessageSentEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_message_sent = Some(Arc::new(f));
        self
    }

    pub fn on_complaint_escalated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ComplaintEscalatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_complaint_escalated = Some(Arc::new(f));
        self
    }
}
