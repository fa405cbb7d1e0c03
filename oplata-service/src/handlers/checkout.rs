//! OPLATA.MD checkout handlers.
//!
//! Payment start, the receipt page that issues the invoice, and the
//! callback the gateway sends the shopper back through.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::AwaitingPaymentResponse,
    services::{
        gateway::{PaymentRedirect, Receipt},
        CallbackOutcome, GatewayError, ReceiptOutcome,
    },
    startup::AppState,
};

/// Start paying an order; the shopper is sent to the receipt page.
pub async fn process_payment(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Json<PaymentRedirect>, AppError> {
    let redirect = state.gateway.process_payment(order_id).await?;
    Ok(Json(redirect))
}

/// Receipt page: issue (or reuse) the invoice and show the pay link.
///
/// An invoice that cannot be created is not an error here; the page offers
/// a retry instead.
pub async fn receipt(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Response, AppError> {
    match state.gateway.prepare_receipt(order_id).await? {
        ReceiptOutcome::Show(receipt) => Ok(Json::<Receipt>(receipt).into_response()),
        ReceiptOutcome::Redirect { status, location } => {
            tracing::info!(order_id, status = %status, location = %location, "Receipt redirect");
            Ok(Redirect::to(&location).into_response())
        }
    }
}

/// Gateway callback.
///
/// Redirects on a terminal invoice status and answers 202 while the
/// invoice is unpaid. A failed status lookup leaves the order as it was.
pub async fn callback(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Response, AppError> {
    let outcome = state.gateway.handle_callback(order_id).await.map_err(|e| {
        if let GatewayError::Invoice(ref err) = e {
            tracing::error!(
                order_id,
                error = %err,
                request = ?err.request(),
                response = ?err.response(),
                "View invoice failed"
            );
        }
        AppError::from(e)
    })?;

    match outcome {
        CallbackOutcome::AwaitingPayment(status) => Ok((
            StatusCode::ACCEPTED,
            Json(AwaitingPaymentResponse {
                order_id,
                invoice_status: status.to_string(),
            }),
        )
            .into_response()),
        CallbackOutcome::Redirect { status, location } => {
            tracing::info!(order_id, status = %status, location = %location, "Callback redirect");
            Ok(Redirect::to(&location).into_response())
        }
    }
}
