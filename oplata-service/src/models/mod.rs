use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order as seen by the gateway. Everything else about the order belongs
/// to the host shop.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    /// Total in minor currency units (bani).
    pub amount: u64,
    pub currency: String,
    pub billing_email: String,
    pub created_at: DateTime<Utc>,
    /// Checkout page the gateway links back to (`ordersStatusLink`).
    pub status_link: String,
    pub cancel_url: String,
    pub return_url: String,
    pub status: OrderStatus,
    /// Gateway transaction id recorded when the order was paid.
    pub payment_reference: Option<String>,
}

impl Order {
    /// Amount with two decimals and a dot separator, e.g. `150.00`.
    pub fn formatted_amount(&self) -> String {
        format!("{}.{:02}", self.amount / 100, self.amount % 100)
    }

    pub fn timestamp(&self) -> i64 {
        self.created_at.timestamp()
    }

    pub fn needs_payment(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Complete,
    Failed,
    Refunded,
}

/// Invoice state as reported by `viewInvoice`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Unpaid,
    Created,
    Error,
    Paid,
    Refunded,
}

impl InvoiceStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(InvoiceStatus::Unpaid),
            1 => Some(InvoiceStatus::Created),
            5 => Some(InvoiceStatus::Error),
            10 => Some(InvoiceStatus::Paid),
            20 => Some(InvoiceStatus::Refunded),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            InvoiceStatus::Unpaid => 0,
            InvoiceStatus::Created => 1,
            InvoiceStatus::Error => 5,
            InvoiceStatus::Paid => 10,
            InvoiceStatus::Refunded => 20,
        }
    }

    /// Unpaid and created invoices are still waiting on the shopper.
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvoiceStatus::Unpaid | InvoiceStatus::Created)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Created => "created",
            InvoiceStatus::Error => "error",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Refunded => "refunded",
        };
        write!(f, "{}", name)
    }
}

/// Parsed `viewInvoice` answer.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub status: InvoiceStatus,
    pub invoice_id: Option<String>,
    pub invoice_amount: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(amount: u64) -> Order {
        Order {
            id: 174,
            amount,
            currency: "MDL".to_string(),
            billing_email: "e@e.e".to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            status_link: "https://shop.md/checkout/174".to_string(),
            cancel_url: "https://shop.md/cart".to_string(),
            return_url: "https://shop.md/thanks/174".to_string(),
            status: OrderStatus::Pending,
            payment_reference: None,
        }
    }

    #[test]
    fn formats_amount_with_two_decimals() {
        assert_eq!(order(15000).formatted_amount(), "150.00");
        assert_eq!(order(5).formatted_amount(), "0.05");
        assert_eq!(order(123456).formatted_amount(), "1234.56");
    }

    #[test]
    fn timestamp_is_unix_seconds() {
        assert_eq!(order(15000).timestamp(), 1577836800);
    }

    #[test]
    fn status_codes_round_trip() {
        for code in [0, 1, 5, 10, 20] {
            assert_eq!(InvoiceStatus::from_code(code).unwrap().code(), code);
        }
        assert_eq!(InvoiceStatus::from_code(2), None);
        assert_eq!(InvoiceStatus::from_code(-1), None);
    }

    #[test]
    fn only_unpaid_and_created_are_pending() {
        assert!(!InvoiceStatus::Unpaid.is_terminal());
        assert!(!InvoiceStatus::Created.is_terminal());
        assert!(InvoiceStatus::Error.is_terminal());
        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(InvoiceStatus::Refunded.is_terminal());
    }
}
