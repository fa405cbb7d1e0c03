//! Invoice request fields and their keyed checksum.
//!
//! The gateway recomputes
//! `md5(value_1::value_2::...::value_n::secretKey)` over the fields it
//! received, so both the field set and the order are part of the wire
//! contract.

use md5::{Digest, Md5};
use serde::Serialize;
use std::fmt;

use crate::models::Order;

const SEPARATOR: &str = "::";

/// Invoice API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Create,
    View,
}

impl InvoiceKind {
    pub fn path(self) -> &'static str {
        match self {
            InvoiceKind::Create => "/invoice/createInvoice",
            InvoiceKind::View => "/invoice/viewInvoice",
        }
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceKind::Create => write!(f, "create"),
            InvoiceKind::View => write!(f, "view"),
        }
    }
}

/// Ordered form fields of one invoice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFields {
    kind: InvoiceKind,
    fields: Vec<(&'static str, String)>,
}

impl InvoiceFields {
    /// Fields for `order` in gateway order.
    ///
    /// `view` deliberately carries no `ordersStatusLink` or `cartEmail`.
    pub fn for_order(kind: InvoiceKind, order: &Order, project_title: &str) -> Self {
        let fields = match kind {
            InvoiceKind::Create => vec![
                ("ordersId", order.id.to_string()),
                ("projectsTitle", project_title.to_string()),
                ("ordersAmount", order.formatted_amount()),
                ("ordersStatusLink", order.status_link.clone()),
                ("cartEmail", order.billing_email.clone()),
                ("timestamp", order.timestamp().to_string()),
            ],
            InvoiceKind::View => vec![
                ("ordersId", order.id.to_string()),
                ("projectsTitle", project_title.to_string()),
                ("ordersAmount", order.formatted_amount()),
                ("timestamp", order.timestamp().to_string()),
            ],
        };

        Self { kind, fields }
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn checksum(&self, secret_key: &str) -> String {
        generate_checksum(self.fields.iter().map(|(_, value)| value.as_str()), secret_key)
    }

    /// Form body: the fields followed by `checksum`.
    pub fn into_signed_form(self, secret_key: &str) -> Vec<(&'static str, String)> {
        let checksum = self.checksum(secret_key);
        let mut form = self.fields;
        form.push(("checksum", checksum));
        form
    }
}

/// Lowercase hex MD5 over `values` and `secret_key` joined with `::`.
pub fn generate_checksum<'a>(
    values: impl IntoIterator<Item = &'a str>,
    secret_key: &'a str,
) -> String {
    let payload = values
        .into_iter()
        .chain(std::iter::once(secret_key))
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    hex::encode(Md5::digest(payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::{TimeZone, Utc};

    const SECRET: &str = "950856916534772";

    fn order() -> Order {
        Order {
            id: 174,
            amount: 15000,
            currency: "MDL".to_string(),
            billing_email: "e@e.e".to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            status_link: "https://shop.md/checkout/order-pay/174".to_string(),
            cancel_url: "https://shop.md/cart".to_string(),
            return_url: "https://shop.md/thanks".to_string(),
            status: OrderStatus::Pending,
            payment_reference: None,
        }
    }

    #[test]
    fn view_checksum_matches_gateway_example() {
        let fields = InvoiceFields::for_order(InvoiceKind::View, &order(), "demoshop");

        assert_eq!(fields.checksum(SECRET), "5cb31156aebd39e29ba5a978db027395");
    }

    #[test]
    fn checksum_is_deterministic() {
        let a = InvoiceFields::for_order(InvoiceKind::Create, &order(), "demoshop");
        let b = InvoiceFields::for_order(InvoiceKind::Create, &order(), "demoshop");

        assert_eq!(a.checksum(SECRET), b.checksum(SECRET));
    }

    #[test]
    fn any_changed_value_changes_checksum() {
        let base = InvoiceFields::for_order(InvoiceKind::Create, &order(), "demoshop");
        let baseline = base.checksum(SECRET);

        for index in 0..base.fields().len() {
            let mut values: Vec<String> = base.fields().iter().map(|(_, v)| v.clone()).collect();
            values[index].push('x');
            let changed = generate_checksum(values.iter().map(String::as_str), SECRET);
            assert_ne!(changed, baseline, "field {} did not affect checksum", index);
        }

        assert_ne!(base.checksum("another-secret"), baseline);
    }

    #[test]
    fn field_order_is_part_of_checksum() {
        let forward = generate_checksum(["174", "demoshop"], SECRET);
        let reversed = generate_checksum(["demoshop", "174"], SECRET);

        assert_ne!(forward, reversed);
    }

    #[test]
    fn create_and_view_field_sets_differ() {
        let create = InvoiceFields::for_order(InvoiceKind::Create, &order(), "demoshop");
        let view = InvoiceFields::for_order(InvoiceKind::View, &order(), "demoshop");

        let create_keys: Vec<_> = create.fields().iter().map(|(k, _)| *k).collect();
        let view_keys: Vec<_> = view.fields().iter().map(|(k, _)| *k).collect();

        assert_eq!(
            create_keys,
            [
                "ordersId",
                "projectsTitle",
                "ordersAmount",
                "ordersStatusLink",
                "cartEmail",
                "timestamp"
            ]
        );
        assert_eq!(view_keys, ["ordersId", "projectsTitle", "ordersAmount", "timestamp"]);
    }

    #[test]
    fn signed_form_appends_checksum_last() {
        let fields = InvoiceFields::for_order(InvoiceKind::View, &order(), "demoshop");
        let expected = fields.checksum(SECRET);
        let form = fields.into_signed_form(SECRET);

        assert_eq!(form.len(), 5);
        assert_eq!(form[4], ("checksum", expected));
    }
}
