use service_core::error::AppError;
use thiserror::Error;

use super::checksum::InvoiceKind;

/// Failure talking to the OPLATA.MD invoice API.
///
/// Every variant keeps the form payload that was sent; response variants
/// also keep the body the gateway answered with.
#[derive(Debug, Error)]
pub enum OplataError {
    #[error("OPLATA.MD credentials not configured")]
    NotConfigured,

    #[error("{operation} invoice request failed: {detail}")]
    TransportFailure {
        operation: InvoiceKind,
        request: serde_json::Value,
        detail: String,
    },

    #[error("{operation} invoice request returned an empty response")]
    EmptyResponse {
        operation: InvoiceKind,
        request: serde_json::Value,
    },

    #[error("{operation} invoice response is malformed: {reason}")]
    MalformedResponse {
        operation: InvoiceKind,
        request: serde_json::Value,
        response: String,
        reason: String,
    },

    #[error("unrecognized invoice status {status}")]
    UnrecognizedStatus {
        request: serde_json::Value,
        response: String,
        status: String,
    },
}

impl OplataError {
    pub fn request(&self) -> Option<&serde_json::Value> {
        match self {
            OplataError::NotConfigured => None,
            OplataError::TransportFailure { request, .. }
            | OplataError::EmptyResponse { request, .. }
            | OplataError::MalformedResponse { request, .. }
            | OplataError::UnrecognizedStatus { request, .. } => Some(request),
        }
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            OplataError::MalformedResponse { response, .. }
            | OplataError::UnrecognizedStatus { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Failure of a checkout or callback step.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("order {0} not found")]
    OrderNotFound(u64),

    #[error("OPLATA.MD does not support currency {0}")]
    Unavailable(String),

    #[error("order {0} does not need payment")]
    NotPayable(u64),

    #[error(transparent)]
    Invoice(#[from] OplataError),

    #[error("order store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::OrderNotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            GatewayError::Unavailable(_) => AppError::ServiceUnavailable(err.to_string()),
            GatewayError::NotPayable(_) => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            GatewayError::Invoice(OplataError::NotConfigured) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            GatewayError::Invoice(e) => AppError::BadGateway(e.to_string()),
            GatewayError::Store(e) => AppError::InternalError(e),
        }
    }
}
