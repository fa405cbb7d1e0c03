use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Order, OrderStatus};

/// Host shop registering an order for payment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub id: u64,
    /// Total in minor units (bani).
    #[validate(range(min = 1))]
    pub amount: u64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(email)]
    pub billing_email: String,
    pub created_at: DateTime<Utc>,
    #[validate(url)]
    pub status_link: String,
    #[validate(url)]
    pub cancel_url: String,
    #[validate(url)]
    pub return_url: String,
}

fn default_currency() -> String {
    "MDL".to_string()
}

impl From<CreateOrderRequest> for Order {
    fn from(request: CreateOrderRequest) -> Self {
        Order {
            id: request.id,
            amount: request.amount,
            currency: request.currency.to_uppercase(),
            billing_email: request.billing_email,
            created_at: request.created_at,
            status_link: request.status_link,
            cancel_url: request.cancel_url,
            return_url: request.return_url,
            status: OrderStatus::Pending,
            payment_reference: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: u64,
    pub amount: String,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    /// Invoice page on the gateway; empty when the order has none.
    pub transaction_url: String,
}

impl OrderResponse {
    pub fn new(order: Order, transaction_url: String) -> Self {
        Self {
            amount: order.formatted_amount(),
            id: order.id,
            currency: order.currency,
            status: order.status,
            payment_reference: order.payment_reference,
            transaction_url,
        }
    }
}

/// Returned while the invoice is still unpaid.
#[derive(Debug, Serialize)]
pub struct AwaitingPaymentResponse {
    pub order_id: u64,
    pub invoice_status: String,
}
