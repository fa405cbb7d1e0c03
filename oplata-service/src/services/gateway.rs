//! Payment lifecycle of a single order: checkout, receipt page and the
//! gateway callback.

use serde::Serialize;
use std::sync::Arc;

use crate::config::CheckoutConfig;
use crate::models::{InvoiceStatus, Order, OrderStatus};

use super::error::GatewayError;
use super::oplata::OplataClient;
use super::store::{OrderProvider, PaymentResultSink, TransactionStore};

pub const GATEWAY_ID: &str = "oplatamd";
pub const SUPPORTED_CURRENCY: &str = "MDL";

const FAILED_NOTE: &str = "Ошибка оплаты";
const REFUNDED_NOTE: &str = "Платеж возвращён";
const RETRY_MESSAGE: &str = "Произошла ошибка. Перезагрузите страницу, чтобы попробовать ещё раз.";
const PAY_MESSAGE: &str = "Спасибо за Ваш заказ, пожалуйста, нажмите кнопку ниже, чтобы заплатить.";

/// Payment method as shown at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub id: &'static str,
    pub title: String,
    pub description: String,
    pub available: bool,
}

/// Where the shopper goes after `process_payment`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRedirect {
    pub result: &'static str,
    pub redirect: String,
}

/// Result of checking an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Unpaid or created: nothing changed, poll again later.
    AwaitingPayment(InvoiceStatus),
    /// Terminal status applied to the order.
    Redirect {
        status: InvoiceStatus,
        location: String,
    },
}

/// Content of the order receipt page.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub order_id: u64,
    /// Hosted payment page; absent when the invoice could not be created.
    pub pay_url: Option<String>,
    pub cancel_url: String,
    pub message: String,
    pub instructions: String,
}

/// What the receipt step asks the HTTP layer to do.
#[derive(Debug, Clone)]
pub enum ReceiptOutcome {
    Show(Receipt),
    Redirect {
        status: InvoiceStatus,
        location: String,
    },
}

#[derive(Clone)]
pub struct PaymentGateway {
    client: OplataClient,
    checkout: CheckoutConfig,
    orders: Arc<dyn OrderProvider>,
    results: Arc<dyn PaymentResultSink>,
    transactions: Arc<dyn TransactionStore>,
}

impl PaymentGateway {
    pub fn new(
        client: OplataClient,
        checkout: CheckoutConfig,
        orders: Arc<dyn OrderProvider>,
        results: Arc<dyn PaymentResultSink>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            client,
            checkout,
            orders,
            results,
            transactions,
        }
    }

    pub fn client(&self) -> &OplataClient {
        &self.client
    }

    /// OPLATA.MD only settles in Moldovan lei.
    pub fn is_available_for(&self, currency: &str) -> bool {
        currency.eq_ignore_ascii_case(SUPPORTED_CURRENCY)
    }

    pub fn payment_method(&self) -> PaymentMethod {
        PaymentMethod {
            id: GATEWAY_ID,
            title: self.checkout.title.clone(),
            description: self.checkout.description.clone(),
            available: self.is_available_for(&self.checkout.store_currency),
        }
    }

    /// Send the shopper to the order's receipt page.
    pub async fn process_payment(&self, order_id: u64) -> Result<PaymentRedirect, GatewayError> {
        let order = self.load_order(order_id).await?;
        self.ensure_available(&order)?;
        if !order.needs_payment() {
            return Err(GatewayError::NotPayable(order_id));
        }

        let redirect = format!(
            "{}/orders/{}/receipt",
            self.checkout.public_base_url.trim_end_matches('/'),
            order.id
        );
        tracing::info!(order_id, redirect = %redirect, "Payment started");

        Ok(PaymentRedirect {
            result: "success",
            redirect,
        })
    }

    /// Make sure an invoice exists, check its status once, and describe
    /// what the shopper should see next.
    pub async fn prepare_receipt(&self, order_id: u64) -> Result<ReceiptOutcome, GatewayError> {
        let order = self.load_order(order_id).await?;
        self.ensure_available(&order)?;

        if let Some((status, location)) = settled_destination(&order) {
            tracing::info!(order_id, status = ?order.status, "Order already settled");
            return Ok(ReceiptOutcome::Redirect { status, location });
        }

        let transaction = match self.transactions.pending_transaction(order_id).await? {
            Some(transaction_id) => Ok(transaction_id),
            None => self.create_invoice(&order).await,
        };

        if transaction.is_ok() {
            match self.apply_status(&order).await {
                Ok(CallbackOutcome::Redirect { status, location }) => {
                    return Ok(ReceiptOutcome::Redirect { status, location });
                }
                Ok(CallbackOutcome::AwaitingPayment(_)) => {}
                Err(GatewayError::Invoice(e)) => {
                    tracing::warn!(order_id, error = %e, "View invoice failed");
                }
                Err(e) => return Err(e),
            }
        }

        let (pay_url, message) = match transaction {
            Ok(transaction_id) => (
                Some(self.client.payment_page_url(&transaction_id)),
                PAY_MESSAGE.to_string(),
            ),
            Err(GatewayError::Invoice(e)) => {
                tracing::warn!(order_id, error = %e, "Invoice unavailable, shopper may retry");
                (None, RETRY_MESSAGE.to_string())
            }
            Err(e) => return Err(e),
        };

        Ok(ReceiptOutcome::Show(Receipt {
            order_id,
            pay_url,
            cancel_url: order.cancel_url,
            message,
            instructions: self.checkout.instructions.clone(),
        }))
    }

    /// Create an invoice for the order and remember its transaction id.
    pub async fn create_invoice(&self, order: &Order) -> Result<String, GatewayError> {
        let transaction_id = self.client.create_invoice(order).await?;
        self.transactions
            .store_transaction(order.id, &transaction_id)
            .await?;
        Ok(transaction_id)
    }

    /// Gateway callback: read the invoice and apply a terminal status.
    pub async fn handle_callback(&self, order_id: u64) -> Result<CallbackOutcome, GatewayError> {
        let order = self.load_order(order_id).await?;
        self.apply_status(&order).await
    }

    /// Gateway page for the order's invoice, or an empty string when the
    /// order has none.
    pub async fn transaction_url(&self, order: &Order) -> Result<String, GatewayError> {
        let transaction_id = match &order.payment_reference {
            Some(reference) => Some(reference.clone()),
            None => self.transactions.pending_transaction(order.id).await?,
        };

        Ok(transaction_id
            .filter(|id| !id.is_empty())
            .map(|id| self.client.payment_page_url(&id))
            .unwrap_or_default())
    }

    async fn apply_status(&self, order: &Order) -> Result<CallbackOutcome, GatewayError> {
        let view = self.client.view_invoice(order).await?;
        let status = view.status;

        tracing::info!(
            order_id = order.id,
            status = %status,
            invoice_id = view.invoice_id.as_deref().unwrap_or("-"),
            invoice_amount = view.invoice_amount.as_deref().unwrap_or("-"),
            "Invoice status received"
        );

        let location = match status {
            InvoiceStatus::Unpaid | InvoiceStatus::Created => {
                return Ok(CallbackOutcome::AwaitingPayment(status));
            }
            InvoiceStatus::Error => {
                if order.status == OrderStatus::Pending {
                    self.results.mark_failed(order.id, FAILED_NOTE).await?;
                } else {
                    tracing::debug!(order_id = order.id, status = ?order.status, "Error ignored for settled order");
                }
                order.cancel_url.clone()
            }
            InvoiceStatus::Paid => {
                if order.status == OrderStatus::Complete {
                    tracing::debug!(order_id = order.id, "Order already complete");
                } else {
                    let pending = self.transactions.pending_transaction(order.id).await?;
                    self.results.mark_paid(order.id, pending.as_deref()).await?;
                }
                // Also retries a clear that failed after an earlier completion.
                self.transactions.clear_transaction(order.id).await?;
                order.return_url.clone()
            }
            InvoiceStatus::Refunded => {
                if order.status == OrderStatus::Refunded {
                    tracing::debug!(order_id = order.id, "Order already refunded");
                } else {
                    self.results.mark_refunded(order.id, REFUNDED_NOTE).await?;
                }
                order.cancel_url.clone()
            }
        };

        Ok(CallbackOutcome::Redirect { status, location })
    }

    async fn load_order(&self, order_id: u64) -> Result<Order, GatewayError> {
        self.orders.order(order_id).await?.ok_or_else(|| {
            tracing::warn!(order_id, "Order not found");
            GatewayError::OrderNotFound(order_id)
        })
    }

    /// Both the store and the order must be priced in lei.
    fn ensure_available(&self, order: &Order) -> Result<(), GatewayError> {
        for currency in [&self.checkout.store_currency, &order.currency] {
            if !self.is_available_for(currency) {
                return Err(GatewayError::Unavailable(currency.clone()));
            }
        }
        Ok(())
    }
}

/// Where a shopper belongs once the order no longer awaits payment.
fn settled_destination(order: &Order) -> Option<(InvoiceStatus, String)> {
    match order.status {
        OrderStatus::Pending => None,
        OrderStatus::Complete => Some((InvoiceStatus::Paid, order.return_url.clone())),
        OrderStatus::Failed => Some((InvoiceStatus::Error, order.cancel_url.clone())),
        OrderStatus::Refunded => Some((InvoiceStatus::Refunded, order.cancel_url.clone())),
    }
}
