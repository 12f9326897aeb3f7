use std::fmt::Debug;

use log::*;
use scp_common::Money;

use crate::{
    api::order_objects::{CreateOrderRequest, PricingPolicy},
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderAcceptedEvent, OrderAnnulledEvent, OrderCreatedEvent},
    traits::{OrderGatewayDatabase, OrderGatewayError},
};

/// `OrderFlowApi` is the primary API for creating orders and driving them through the accept/reject/cancel
/// lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
    policy: PricingPolicy,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, policy: PricingPolicy::default(), producers }
    }

    pub fn with_policy(db: B, policy: PricingPolicy, producers: EventProducers) -> Self {
        Self { db, policy, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderGatewayDatabase
{
    /// Creates a new order for the consumer.
    ///
    /// Each requested line is validated against the live catalog: the product must exist, must belong to the
    /// requested supplier, must (advisorily — the authoritative check is the conditional decrement at acceptance)
    /// have enough stock, and the quantity must meet the product's minimum. Unit prices are snapshotted with the
    /// product's current discount applied, so later catalog changes never reprice an existing order.
    ///
    /// The order header and every line item are persisted in a single transaction and the populated order is
    /// returned.
    pub async fn create_order(
        &self,
        consumer_id: &str,
        req: CreateOrderRequest,
    ) -> Result<Order, OrderGatewayError> {
        let mut subtotal = Money::default();
        let mut items = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let product = self
                .db
                .fetch_product(&item.product_id)
                .await?
                .ok_or_else(|| OrderGatewayError::ProductNotFound(item.product_id.clone()))?;
            if product.supplier_id != req.supplier_id {
                return Err(OrderGatewayError::ProductSupplierMismatch {
                    product_id: product.id,
                    supplier_id: req.supplier_id,
                });
            }
            if product.stock_level < item.quantity {
                return Err(OrderGatewayError::InsufficientStock(product.id));
            }
            if item.quantity < product.min_order_quantity {
                return Err(OrderGatewayError::BelowMinimumOrderQuantity {
                    product_id: product.id,
                    minimum: product.min_order_quantity,
                });
            }
            let unit_price = product.effective_price();
            let line_subtotal = unit_price * item.quantity;
            subtotal += line_subtotal;
            items.push(NewOrderItem {
                product_id: product.id,
                quantity: item.quantity,
                unit_price,
                subtotal: line_subtotal,
            });
        }
        if !subtotal.is_positive() {
            return Err(OrderGatewayError::EmptyOrderTotal);
        }
        let tax = subtotal.percentage(self.policy.tax_percent);
        let shipping_fee = self.policy.shipping_fee;
        let total = subtotal + tax + shipping_fee;
        let order = NewOrder {
            consumer_id: consumer_id.to_string(),
            supplier_id: req.supplier_id,
            subtotal,
            tax,
            shipping_fee,
            total,
            items,
        };
        let order = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order {} created for consumer {consumer_id}. Total {}", order.id, order.total);
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Accepts a pending order on behalf of its supplier.
    ///
    /// The authorization and current-status guards run first; the stock commitment and the status flip then happen
    /// in one storage transaction, so an order is only ever `accepted` with every line item's stock decremented, and
    /// concurrent acceptances of overlapping orders can never oversell.
    pub async fn accept_order(&self, order_id: &OrderId, acting_supplier_id: &str) -> Result<Order, OrderGatewayError> {
        let order = self.fetch_order_for_update(order_id).await?;
        if order.supplier_id != acting_supplier_id {
            return Err(OrderGatewayError::Unauthorized(format!(
                "supplier {acting_supplier_id} does not own order {order_id}"
            )));
        }
        if order.status != OrderStatusType::Pending {
            return Err(OrderGatewayError::InvalidTransition { order_id: order.id, status: order.status });
        }
        let order = self.db.accept_order_transactional(&order).await?;
        debug!("🔄️📦️ Order {} accepted by supplier {acting_supplier_id}", order.id);
        self.call_order_accepted_hook(&order).await;
        Ok(order)
    }

    /// Rejects a pending order on behalf of its supplier. Stock is untouched.
    pub async fn reject_order(&self, order_id: &OrderId, acting_supplier_id: &str) -> Result<Order, OrderGatewayError> {
        let order = self.fetch_order_for_update(order_id).await?;
        if order.supplier_id != acting_supplier_id {
            return Err(OrderGatewayError::Unauthorized(format!(
                "supplier {acting_supplier_id} does not own order {order_id}"
            )));
        }
        if order.status != OrderStatusType::Pending {
            return Err(OrderGatewayError::InvalidTransition { order_id: order.id, status: order.status });
        }
        let order =
            self.db.update_order_status(order_id, OrderStatusType::Pending, OrderStatusType::Rejected).await?;
        debug!("🔄️📦️ Order {} rejected by supplier {acting_supplier_id}", order.id);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    /// Cancels a pending order on behalf of the consumer who placed it.
    pub async fn cancel_order(&self, order_id: &OrderId, acting_consumer_id: &str) -> Result<Order, OrderGatewayError> {
        let order = self.fetch_order_for_update(order_id).await?;
        if order.consumer_id != acting_consumer_id {
            return Err(OrderGatewayError::Unauthorized(format!(
                "consumer {acting_consumer_id} does not own order {order_id}"
            )));
        }
        if order.status != OrderStatusType::Pending {
            return Err(OrderGatewayError::InvalidTransition { order_id: order.id, status: order.status });
        }
        let order =
            self.db.update_order_status(order_id, OrderStatusType::Pending, OrderStatusType::Cancelled).await?;
        debug!("🔄️📦️ Order {} cancelled by consumer {acting_consumer_id}", order.id);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderGatewayError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn orders_for_consumer(&self, consumer_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        self.db.orders_for_consumer(consumer_id).await
    }

    pub async fn orders_for_supplier(&self, supplier_id: &str) -> Result<Vec<Order>, OrderGatewayError> {
        self.db.orders_for_supplier(supplier_id).await
    }

    async fn fetch_order_for_update(&self, order_id: &OrderId) -> Result<Order, OrderGatewayError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderGatewayError::OrderNotFound(order_id.clone()))
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            trace!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_order_accepted_hook(&self, order: &Order) {
        for emitter in &self.producers.order_accepted_producer {
            trace!("🔄️📦️ Notifying order accepted hook subscribers");
            emitter.publish_event(OrderAcceptedEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
