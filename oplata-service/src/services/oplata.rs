//! OPLATA.MD invoice API client.
//!
//! Creates invoices (`createInvoice`) and reads their state back
//! (`viewInvoice`). Both calls are checksum-signed form POSTs.

use crate::config::OplataConfig;
use crate::models::{InvoiceStatus, InvoiceView, Order};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;

use super::checksum::{InvoiceFields, InvoiceKind};
use super::error::OplataError;

const USER_AGENT: &str = concat!("oplata-service/", env!("CARGO_PKG_VERSION"));

/// OPLATA.MD client bound to one merchant account.
#[derive(Clone)]
pub struct OplataClient {
    client: Client,
    config: OplataConfig,
}

/// Body of a `viewInvoice` answer. Only `invoiceStatus` is mandatory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewInvoiceResponse {
    invoice_status: Option<Value>,
    invoice_id: Option<Value>,
    invoice_amount: Option<Value>,
}

impl OplataClient {
    pub fn new(config: OplataConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// `path` appended to the live or sandbox base URL.
    pub fn gateway_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url().trim_end_matches('/'), path)
    }

    /// Hosted payment page for a transaction.
    pub fn payment_page_url(&self, transaction_id: &str) -> String {
        self.gateway_url(&format!(
            "/{}/invoice/{}",
            self.config.language(),
            transaction_id
        ))
    }

    /// Create an invoice and return the transaction id.
    pub async fn create_invoice(&self, order: &Order) -> Result<String, OplataError> {
        let (request, body) = self.send(InvoiceKind::Create, order).await?;

        let transaction_id = sanitize_transaction_id(&body);
        if transaction_id.is_empty() {
            tracing::error!(
                order_id = order.id,
                request = %request,
                response = %body,
                "Create invoice returned an empty response"
            );
            return Err(OplataError::EmptyResponse {
                operation: InvoiceKind::Create,
                request,
            });
        }
        if !is_url_safe(&transaction_id) {
            tracing::error!(
                order_id = order.id,
                request = %request,
                response = %body,
                "Create invoice returned an unusable transaction id"
            );
            return Err(OplataError::MalformedResponse {
                operation: InvoiceKind::Create,
                request,
                response: body,
                reason: "transaction id is not a single URL path segment".to_string(),
            });
        }

        tracing::info!(
            order_id = order.id,
            transaction_id = %transaction_id,
            "OPLATA.MD invoice created"
        );
        tracing::debug!(request = %request, response = %body, "Create invoice request success");

        Ok(transaction_id)
    }

    /// Fetch the current invoice state for an order.
    pub async fn view_invoice(&self, order: &Order) -> Result<InvoiceView, OplataError> {
        let (request, body) = self.send(InvoiceKind::View, order).await?;

        if body.trim().is_empty() {
            tracing::error!(order_id = order.id, request = %request, "View invoice returned an empty response");
            return Err(OplataError::EmptyResponse {
                operation: InvoiceKind::View,
                request,
            });
        }

        let malformed = |reason: String| OplataError::MalformedResponse {
            operation: InvoiceKind::View,
            request: request.clone(),
            response: body.clone(),
            reason,
        };

        let raw: Value = serde_json::from_str(&body).map_err(|e| malformed(e.to_string()))?;
        if !raw.is_object() {
            return Err(malformed("response is not a JSON object".to_string()));
        }
        let answer: ViewInvoiceResponse =
            serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;

        let status_value = match answer.invoice_status {
            Some(value) if !value.is_null() => value,
            _ => {
                tracing::error!(
                    order_id = order.id,
                    request = %request,
                    response = %body,
                    "View invoice response has no invoiceStatus"
                );
                return Err(malformed("missing invoiceStatus".to_string()));
            }
        };

        let status = parse_status(&status_value).ok_or_else(|| {
            tracing::warn!(
                order_id = order.id,
                status = %status_value,
                "Unrecognized OPLATA.MD invoice status"
            );
            OplataError::UnrecognizedStatus {
                request: request.clone(),
                response: body.clone(),
                status: status_value.to_string(),
            }
        })?;

        tracing::debug!(request = %request, response = %body, "View invoice request success");

        Ok(InvoiceView {
            status,
            invoice_id: answer.invoice_id.as_ref().map(scalar_to_string),
            invoice_amount: answer.invoice_amount.as_ref().map(scalar_to_string),
        })
    }

    /// POST the signed form for `kind` and return the sent payload and the
    /// response body.
    async fn send(&self, kind: InvoiceKind, order: &Order) -> Result<(Value, String), OplataError> {
        if !self.is_configured() {
            return Err(OplataError::NotConfigured);
        }

        let form = InvoiceFields::for_order(kind, order, &self.config.project_title)
            .into_signed_form(self.config.secret_key.expose_secret());
        let request = form_to_json(&form);
        let url = self.gateway_url(kind.path());

        let transport = |detail: String| OplataError::TransportFailure {
            operation: kind,
            request: request.clone(),
            detail,
        };

        let response = self.client.post(&url).form(&form).send().await.map_err(|e| {
            tracing::error!(operation = %kind, request = %request, error = %e, "Invoice request error");
            transport(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport(e.to_string()))?;

        tracing::debug!(operation = %kind, status = %status, body = %body, "OPLATA.MD response");

        if !status.is_success() {
            tracing::error!(
                operation = %kind,
                status = %status,
                request = %request,
                response = %body,
                "OPLATA.MD rejected invoice request"
            );
            return Err(transport(format!("HTTP {}: {}", status, body)));
        }

        Ok((request, body))
    }
}

fn form_to_json(form: &[(&'static str, String)]) -> Value {
    Value::Object(
        form.iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
            .collect(),
    )
}

/// Drop surrounding whitespace and any control characters.
fn sanitize_transaction_id(body: &str) -> String {
    body.trim().chars().filter(|c| !c.is_control()).collect()
}

/// The id ends up as the last segment of the payment page URL.
fn is_url_safe(transaction_id: &str) -> bool {
    !transaction_id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
}

/// The gateway sends the status as `"10"` or `10`.
fn parse_status(value: &Value) -> Option<InvoiceStatus> {
    let code = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    InvoiceStatus::from_code(code)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
