use scp_common::Money;
use serde::{Deserialize, Serialize};

/// A consumer's order as requested: which supplier, which products, how many. Pricing comes from the catalog at
/// creation time, never from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub supplier_id: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// The pricing knobs applied to every new order. Tax is a flat percentage of the subtotal; the shipping fee is a
/// fixed amount (zero until a rate card exists).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    pub tax_percent: f64,
    pub shipping_fee: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { tax_percent: 10.0, shipping_fee: Money::default() }
    }
}
